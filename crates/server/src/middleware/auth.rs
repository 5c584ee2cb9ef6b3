use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use service::auth::errors::AuthError;
use tracing::warn;

use crate::errors::ApiError;
use crate::extract::{request_path, AccessClaims};
use crate::state::ServerState;

/// Endpoints that must work with a stale or missing access token.
const TOKEN_EXEMPT: [&str; 2] = ["/api/v1/auth/login", "/api/v1/auth/refresh"];

fn bearer(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidToken("malformed Authorization header".into()))?;
    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(Some(token.to_string())),
        _ => Err(AuthError::InvalidToken("expected Authorization: Bearer <token>".into())),
    }
}

/// Validates a bearer token when present and attaches the principal.
///
/// Requests without a token pass through anonymously; handlers decide whether
/// that is enough. A present but invalid token is rejected with 401.
pub async fn authenticate(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let path = request_path(&req);
    if TOKEN_EXEMPT.contains(&path.as_str()) {
        return next.run(req).await;
    }
    let token = match bearer(req.headers()) {
        Ok(Some(token)) => token,
        Ok(None) => return next.run(req).await,
        Err(e) => return ApiError::from(e).into_response(),
    };
    match state.auth.authenticate(&token).await {
        Ok((principal, claims)) => {
            req.extensions_mut().insert(principal.clone());
            req.extensions_mut().insert(AccessClaims(claims));
            let mut res = next.run(req).await;
            // read back by the audit layer
            res.extensions_mut().insert(principal);
            res
        }
        Err(e) => {
            warn!(path = %path, error = %e, "bearer token rejected");
            ApiError::from(e).into_response()
        }
    }
}
