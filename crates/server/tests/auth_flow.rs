mod common;

use axum::http::{header, StatusCode};
use common::{spawn_app, spawn_app_with, ADMIN_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn login_returns_tokens_permissions_and_refresh_cookie() {
    let app = spawn_app().await;
    let res = app.login("admin", ADMIN_PASSWORD).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["token_type"], "Bearer");
    assert_eq!(res.body["expires_in"], 3600);
    assert!(res.body["refresh_token"].as_str().is_some());
    assert_eq!(res.body["user"]["roles"], json!(["SUPER_ADMIN"]));
    let perms = res.body["user"]["permissions"].as_array().unwrap();
    assert!(perms.contains(&json!("PERMISSION_SYSTEM_MANAGE")));

    let cookie = res.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("refresh_token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn bad_credentials_are_401_with_envelope() {
    let app = spawn_app().await;
    let res = app.login("admin", "wrong-password").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["status"], 401);
    assert_eq!(res.body["error"], "Unauthorized");
    assert_eq!(res.body["path"], "/api/v1/auth/login");
    assert!(res.body["timestamp"].is_string());

    let res = app.login("nobody", "whatever-pass").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = spawn_app().await;
    assert_eq!(app.get("/api/v1/auth/me", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/v1/auth/me", Some("not-a-jwt")).await.status, StatusCode::UNAUTHORIZED);

    let token = app.admin_token().await;
    let me = app.get("/api/v1/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "admin");
}

#[tokio::test]
async fn logout_revokes_the_access_token() {
    let app = spawn_app().await;
    let token = app.admin_token().await;
    let res = app.request(axum::http::Method::POST, "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/api/v1/auth/me", Some(&token)).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_tokens() {
    let app = spawn_app().await;
    let login = app.login("admin", ADMIN_PASSWORD).await;
    let refresh = login.body["refresh_token"].as_str().unwrap().to_string();

    let res = app.post("/api/v1/auth/refresh", None, json!({"refresh_token": refresh})).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let new_access = res.body["access_token"].as_str().unwrap().to_string();
    assert_eq!(app.get("/api/v1/auth/me", Some(&new_access)).await.status, StatusCode::OK);

    let reused = app.post("/api/v1/auth/refresh", None, json!({"refresh_token": refresh})).await;
    assert_eq!(reused.status, StatusCode::UNAUTHORIZED);

    // an access token is not a refresh token
    let wrong = app.post("/api/v1/auth/refresh", None, json!({"refresh_token": new_access})).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_users_cannot_log_in() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let created = app
        .post(
            "/api/v1/admin/users",
            Some(&admin),
            json!({"username": "gone", "email": "gone@club.example.org", "full_name": "Gone", "password": "UserPass123", "active": false}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(app.login("gone", "UserPass123").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_attempts_are_rate_limited_per_ip() {
    let app = spawn_app_with(|cfg| {
        cfg.rate_limit.login_requests_per_minute = 1;
        cfg.rate_limit.login_burst = 2;
    })
    .await;
    assert_eq!(app.login("admin", "bad-password").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("admin", "bad-password").await.status, StatusCode::UNAUTHORIZED);
    let limited = app.login("admin", ADMIN_PASSWORD).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["status"], 429);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_login_limit() {
    let app = spawn_app_with(|cfg| {
        cfg.rate_limit.login_requests_per_minute = 1;
        cfg.rate_limit.login_burst = 2;
    })
    .await;
    let mut limited = 0;
    for i in 0..20 {
        let res = app.login_from(&format!("203.0.113.{i}"), "admin", "bad-password").await;
        if res.status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }
    assert_eq!(limited, 18);
    assert_eq!(app.state.login_limiter.tracked_keys(), 1);
}

#[tokio::test]
async fn forwarded_for_is_honoured_behind_a_trusted_proxy() {
    let app = spawn_app_with(|cfg| {
        cfg.rate_limit.login_requests_per_minute = 1;
        cfg.rate_limit.login_burst = 1;
        cfg.rate_limit.trust_forwarded_for = true;
    })
    .await;
    assert_eq!(app.login_from("203.0.113.1", "admin", "bad-password").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login_from("203.0.113.1", "admin", "bad-password").await.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.login_from("203.0.113.2", "admin", ADMIN_PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn successful_login_is_audited_with_the_user() {
    let app = spawn_app().await;
    let token = app.admin_token().await;
    let res = app.get("/api/v1/admin/audit-logs?action=LOGIN&success=true", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let row = &res.body["items"][0];
    assert_eq!(row["username"], "admin");
    assert!(row["user_id"].is_string());
    assert_eq!(row["status_code"], 200);
}
