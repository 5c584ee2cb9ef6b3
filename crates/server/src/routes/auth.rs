use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use service::auth::domain::{AuthSession, LoginInput, UserInfo};
use service::authz::Principal;
use tracing::{info, warn};

use crate::errors::ApiError;
use crate::extract::{AccessClaims, ApiJson, ClientAddr, CurrentUser};
use crate::metrics;
use crate::state::ServerState;

pub const REFRESH_COOKIE: &str = "refresh_token";
const COOKIE_PATH: &str = "/api/v1/auth";

#[derive(Debug, Default, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: Option<String>,
}

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn refresh_cookie(state: &ServerState, token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .path(COOKIE_PATH)
        .http_only(true)
        .secure(state.config.auth.cookie_secure)
        .same_site(SameSite::Strict)
        .build()
}

/// Principal of a fresh session; the audit layer reads it from the response.
fn session_principal(session: &AuthSession) -> Extension<Principal> {
    let user = &session.user;
    Extension(Principal::new(user.id, user.username.clone(), user.roles.clone()))
}

pub async fn login(
    State(state): State<ServerState>,
    addr: ClientAddr,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<(CookieJar, Extension<Principal>, Json<AuthSession>), ApiError> {
    let key = state.login_limiter.key_for(addr.forwarded.as_deref(), addr.peer.as_deref());
    if !state.login_limiter.check(&key) {
        metrics::RATE_LIMITED_TOTAL.inc();
        return Err(ApiError::too_many_requests());
    }
    let session = match state.auth.login(input).await {
        Ok(session) => session,
        Err(e) => {
            metrics::LOGIN_FAILURES_TOTAL.inc();
            warn!(client_ip = %key, error = %e, "login rejected");
            return Err(e.into());
        }
    };
    info!(user_id = %session.user.id, "login");
    let jar = jar.add(refresh_cookie(&state, session.refresh_token.clone()));
    Ok((jar, session_principal(&session), Json(session)))
}

/// Token from the body when given, else from the cookie.
pub async fn refresh(
    State(state): State<ServerState>,
    jar: CookieJar,
    body: Option<ApiJson<RefreshInput>>,
) -> Result<(CookieJar, Extension<Principal>, Json<AuthSession>), ApiError> {
    let token = body
        .and_then(|ApiJson(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| ApiError::unauthorized("refresh token required"))?;
    let session = state.auth.refresh(&token).await?;
    let jar = jar.add(refresh_cookie(&state, session.refresh_token.clone()));
    Ok((jar, session_principal(&session), Json(session)))
}

pub async fn logout(
    State(state): State<ServerState>,
    _user: CurrentUser,
    AccessClaims(claims): AccessClaims,
    jar: CookieJar,
    body: Option<ApiJson<RefreshInput>>,
) -> (CookieJar, StatusCode) {
    let refresh = body
        .and_then(|ApiJson(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()));
    state.auth.logout(&claims, refresh.as_deref()).await;
    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path(COOKIE_PATH));
    (jar, StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<ServerState>, CurrentUser(principal): CurrentUser) -> Result<Json<UserInfo>, ApiError> {
    Ok(Json(state.auth.current_user(principal.user_id).await?))
}
