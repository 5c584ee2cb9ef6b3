#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use server::ServerState;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "AdminPass123";

pub struct TestApp {
    pub router: Router,
    pub state: ServerState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_config() -> configs::AppConfig {
    let mut cfg = configs::AppConfig::default();
    cfg.database = configs::DatabaseConfig::sqlite_memory();
    cfg.auth.jwt_secret = "integration-test-secret-0123".into();
    cfg.bootstrap.admin_password = Some(ADMIN_PASSWORD.into());
    cfg.scheduler.publish_interval_secs = 0;
    cfg.rate_limit.login_requests_per_minute = 600;
    cfg.rate_limit.login_burst = 100;
    cfg
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut configs::AppConfig)) -> TestApp {
    let mut cfg = test_config();
    tweak(&mut cfg);
    let state = server::build_state(cfg).await.expect("build state");
    TestApp { router: server::build_router(state.clone()), state }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.request_from("198.51.100.10", method, uri, token, body).await
    }

    /// Sends the request with `forwarded` as the `X-Forwarded-For` header.
    pub async fn request_from(
        &self,
        forwarded: &str,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri).header("x-forwarded-for", forwarded);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = self.router.clone().oneshot(req).await.expect("router is infallible");
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post("/api/v1/auth/login", None, json!({"username": username, "password": password})).await
    }

    pub async fn login_from(&self, forwarded: &str, username: &str, password: &str) -> TestResponse {
        let body = json!({"username": username, "password": password});
        self.request_from(forwarded, Method::POST, "/api/v1/auth/login", None, Some(body)).await
    }

    pub async fn admin_token(&self) -> String {
        let res = self.login("admin", ADMIN_PASSWORD).await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        res.body["access_token"].as_str().unwrap().to_string()
    }

    /// Creates an account with `roles` through the admin API and returns its access token.
    pub async fn token_for(&self, username: &str, roles: &[&str]) -> String {
        let admin = self.admin_token().await;
        let res = self
            .post(
                "/api/v1/admin/users",
                Some(&admin),
                json!({
                    "username": username,
                    "email": format!("{username}@club.example.org"),
                    "full_name": username,
                    "password": "UserPass123",
                    "roles": roles,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        let res = self.login(username, "UserPass123").await;
        res.body["access_token"].as_str().unwrap().to_string()
    }
}
