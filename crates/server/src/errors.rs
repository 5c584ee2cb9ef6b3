use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use models::errors::{FieldError, ModelError};
use serde::{Deserialize, Serialize};
use service::auth::errors::AuthError;
use service::authz::AuthzError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub field_errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), field_errors: Vec::new() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "too many requests, retry later")
    }

    /// Logs the detail and returns a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }

    fn invalid(field_errors: Vec<FieldError>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: "validation failed".into(), field_errors }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            status: self.status.as_u16(),
            error: self.status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.message,
            path: String::new(),
            timestamp: Utc::now(),
            field_errors: self.field_errors,
        };
        let mut res = (self.status, Json(envelope.clone())).into_response();
        res.extensions_mut().insert(envelope);
        res
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::Invalid(errors) => ApiError::invalid(errors),
            ServiceError::Unprocessable(msg) => ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, msg),
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Conflict(msg) => {
                warn!(detail = %msg, "conflict");
                ApiError::new(StatusCode::CONFLICT, "resource already exists")
            }
            ServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::RateLimited => ApiError::too_many_requests(),
            ServiceError::Model(m) => m.into(),
            ServiceError::Db(msg) | ServiceError::Internal(msg) => ApiError::internal(msg),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ApiError::bad_request(msg),
            ModelError::Invalid(errors) => ApiError::invalid(errors),
            ModelError::Conflict(msg) => {
                warn!(detail = %msg, "conflict");
                ApiError::new(StatusCode::CONFLICT, "resource already exists")
            }
            ModelError::Db(msg) => ApiError::internal(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::bad_request(msg),
            AuthError::NotFound => ApiError::not_found(e.to_string()),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => ApiError::internal(e),
            // Unauthorized, Inactive, TokenExpired, InvalidToken, Revoked
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(e: AuthzError) -> Self {
        match e {
            AuthzError::UnknownRole(_) | AuthzError::UnknownPermission(_) => ApiError::bad_request(e.to_string()),
            _ => ApiError::forbidden(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        let status = match r {
            JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, r.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(r: PathRejection) -> Self {
        ApiError::bad_request(r.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        ApiError::bad_request(r.body_text())
    }
}

/// Fills the request path into error envelopes produced further down the stack.
pub async fn attach_request_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let res = next.run(req).await;
    let Some(mut envelope) = res.extensions().get::<ErrorEnvelope>().cloned() else {
        return res;
    };
    envelope.path = path;
    let (mut parts, _) = res.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    let body = Json(envelope.clone()).into_response().into_body();
    parts.extensions.insert(envelope);
    Response::from_parts(parts, body)
}

/// Unmatched routes.
pub async fn fallback() -> ApiError {
    ApiError::not_found("no route for this path")
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
