use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, OriginalUri, Request};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use service::auth::token::Claims;
use service::authz::{Permission, Principal};

use crate::errors::ApiError;

/// JSON body whose rejections render as the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Claims of the bearer token, stored next to the principal by the auth middleware.
#[derive(Clone, Debug)]
pub struct AccessClaims(pub Claims);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AccessClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

/// Authenticated caller; rejects with 401 when the request carries no valid token.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Principal);

impl CurrentUser {
    pub fn require(&self, permission: Permission) -> Result<&Principal, ApiError> {
        self.0.require_permission(permission)?;
        Ok(&self.0)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

/// Caller if authenticated; anonymous requests pass through.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<Principal>);

impl MaybeUser {
    pub fn has(&self, permission: Permission) -> bool {
        self.0.as_ref().map_or(false, |p| p.has_permission(permission))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Principal>().cloned()))
    }
}

/// Both candidate client addresses. The forwarded one is client-supplied.
#[derive(Clone, Debug, Default)]
pub struct ClientAddr {
    pub forwarded: Option<String>,
    pub peer: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientAddr {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientAddr { forwarded: forwarded_for(&parts.headers), peer: peer_ip(&parts.extensions) })
    }
}

/// Full request path, including the prefix stripped by nested routers.
pub fn request_path(req: &Request) -> String {
    req.extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string())
}

/// First `X-Forwarded-For` hop.
pub fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn peer_ip(extensions: &Extensions) -> Option<String> {
    extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0.ip().to_string())
}

/// Address recorded in the audit trail: forwarded client, else the peer.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    forwarded_for(headers).or_else(|| peer_ip(extensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));
        assert_eq!(client_ip(&headers, &ext).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&HeaderMap::new(), &ext).as_deref(), Some("127.0.0.1"));
        assert_eq!(client_ip(&HeaderMap::new(), &Extensions::new()), None);
        assert_eq!(forwarded_for(&headers).as_deref(), Some("203.0.113.7"));
        assert_eq!(peer_ip(&ext).as_deref(), Some("127.0.0.1"));
    }
}
