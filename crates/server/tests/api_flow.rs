mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Days, Utc};
use common::spawn_app;
use serde_json::{json, Value};
use tower::ServiceExt;

fn member(number: &str) -> Value {
    json!({
        "membership_number": number,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": format!("{}@club.example.org", number.to_lowercase()),
        "membership_type": "REGULAR",
    })
}

#[tokio::test]
async fn health_is_public_and_carries_security_headers() {
    let app = spawn_app().await;
    let res = app.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(res.headers.get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn unknown_route_is_404_envelope_with_path() {
    let app = spawn_app().await;
    let res = app.get("/api/v1/nowhere", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["status"], 404);
    assert_eq!(res.body["path"], "/api/v1/nowhere");
}

#[tokio::test]
async fn members_need_permissions() {
    let app = spawn_app().await;
    assert_eq!(app.get("/api/v1/members", None).await.status, StatusCode::UNAUTHORIZED);

    let viewer = app.token_for("viewer", &["USER"]).await;
    assert_eq!(app.get("/api/v1/members", Some(&viewer)).await.status, StatusCode::OK);
    let denied = app.post("/api/v1/members", Some(&viewer), member("M-1")).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["error"], "Forbidden");

    let admin = app.admin_token().await;
    let created = app.post("/api/v1/members", Some(&admin), member("M-1")).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["status"], "ACTIVE");
    let id = created.body["id"].as_str().unwrap().to_string();

    let dup = app.post("/api/v1/members", Some(&admin), member("M-1")).await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let list = app.get("/api/v1/members?q=Lovelace", Some(&viewer)).await;
    assert_eq!(list.body["total_items"], 1);

    assert_eq!(app.delete(&format!("/api/v1/members/{id}"), Some(&admin)).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&format!("/api/v1/members/{id}"), Some(&admin)).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_member_reports_field_errors() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let mut bad = member("M-2");
    bad["email"] = json!("not-an-email");
    bad["first_name"] = json!("");
    let res = app.post("/api/v1/members", Some(&admin), bad).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = res.body["field_errors"].as_array().unwrap().iter().map(|f| f["field"].as_str().unwrap()).collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"first_name"));
}

#[tokio::test]
async fn malformed_json_and_bad_ids_are_client_errors() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let res = app.post("/api/v1/members", Some(&admin), json!({"first_name": 3})).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = app.get("/api/v1/members/not-a-uuid", Some(&admin)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn drafts_are_hidden_from_the_public() {
    let app = spawn_app().await;
    let editor = app.token_for("editor", &["EDITOR"]).await;
    let created = app
        .post("/api/v1/news", Some(&editor), json!({"title": "Season Opener", "content": "Welcome back."}))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["status"], "DRAFT");
    assert_eq!(created.body["slug"], "season-opener");
    let id = created.body["id"].as_str().unwrap().to_string();

    assert_eq!(app.get("/api/v1/news/season-opener", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/v1/news", None).await.body["total_items"], 0);
    assert_eq!(app.get("/api/v1/news/season-opener", Some(&editor)).await.status, StatusCode::OK);

    let published = app.post(&format!("/api/v1/news/{id}/publish"), Some(&editor), json!({})).await;
    assert_eq!(published.status, StatusCode::OK, "{}", published.body);
    assert_eq!(published.body["status"], "PUBLISHED");

    let public = app.get("/api/v1/news/season-opener", None).await;
    assert_eq!(public.status, StatusCode::OK);
    assert_eq!(public.body["title"], "Season Opener");
    assert_eq!(app.get("/api/v1/news", None).await.body["total_items"], 1);
}

#[tokio::test]
async fn scheduling_in_the_past_is_rejected() {
    let app = spawn_app().await;
    let editor = app.token_for("scheduler", &["EDITOR"]).await;
    let created = app.post("/api/v1/news", Some(&editor), json!({"title": "Later", "content": "Soon."})).await;
    let id = created.body["id"].as_str().unwrap().to_string();
    let past = Utc::now() - chrono::Duration::hours(1);
    let res = app.post(&format!("/api/v1/news/{id}/schedule"), Some(&editor), json!({"publish_at": past})).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let future = Utc::now() + chrono::Duration::days(1);
    let res = app.post(&format!("/api/v1/news/{id}/schedule"), Some(&editor), json!({"publish_at": future})).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["status"], "SCHEDULED");
}

#[tokio::test]
async fn tournament_registration_and_bracket() {
    let app = spawn_app().await;
    let editor = app.token_for("organiser", &["EDITOR"]).await;
    let start = Utc::now().date_naive() + Days::new(14);
    let t = app
        .post(
            "/api/v1/tournaments",
            Some(&editor),
            json!({
                "name": "Winter Cup",
                "start_date": start,
                "end_date": start + Days::new(2),
                "max_participants": 8,
                "status": "REGISTRATION_OPEN",
            }),
        )
        .await;
    assert_eq!(t.status, StatusCode::CREATED, "{}", t.body);
    let tid = t.body["id"].as_str().unwrap().to_string();

    let mut players = Vec::new();
    for (i, name) in ["Ann", "Ben", "Cid"].iter().enumerate() {
        let p = app
            .post("/api/v1/players", Some(&editor), json!({"first_name": name, "last_name": "Player", "ranking": i + 1}))
            .await;
        assert_eq!(p.status, StatusCode::CREATED, "{}", p.body);
        players.push(p.body["id"].as_str().unwrap().to_string());
    }
    for (i, pid) in players.iter().enumerate() {
        let r = app
            .post(&format!("/api/v1/tournaments/{tid}/registrations"), Some(&editor), json!({"player_id": pid, "seed": i + 1}))
            .await;
        assert_eq!(r.status, StatusCode::CREATED, "{}", r.body);
    }
    let dup = app
        .post(&format!("/api/v1/tournaments/{tid}/registrations"), Some(&editor), json!({"player_id": players[0]}))
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let regs = app.get(&format!("/api/v1/tournaments/{tid}/registrations"), None).await;
    assert_eq!(regs.body.as_array().unwrap().len(), 3);

    let bracket = app.get(&format!("/api/v1/tournaments/{tid}/bracket"), None).await;
    assert_eq!(bracket.status, StatusCode::OK);
    assert_eq!(bracket.body["entrants"], 3);
    assert_eq!(bracket.body["size"], 4);
    let first = &bracket.body["rounds"][0]["matches"];
    assert_eq!(first.as_array().unwrap().len(), 2);
    assert_eq!(first[0]["home"]["seed"], 1);
    assert_eq!(first[0]["bye"], true);

    let withdraw = app.delete(&format!("/api/v1/tournaments/{tid}/registrations/{}", players[2]), Some(&editor)).await;
    assert_eq!(withdraw.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn download_hits_are_public_and_counted() {
    let app = spawn_app().await;
    let editor = app.token_for("librarian", &["EDITOR"]).await;
    let d = app
        .post(
            "/api/v1/downloads",
            Some(&editor),
            json!({"title": "Rulebook", "file_url": "https://files.example.org/rules.pdf", "category": "rules"}),
        )
        .await;
    assert_eq!(d.status, StatusCode::CREATED, "{}", d.body);
    let id = d.body["id"].as_str().unwrap().to_string();
    let hit = app.post(&format!("/api/v1/downloads/{id}/hit"), None, json!({})).await;
    assert_eq!(hit.status, StatusCode::OK);
    assert_eq!(hit.body["download_count"], 1);
    let hit = app.post(&format!("/api/v1/downloads/{id}/hit"), None, json!({})).await;
    assert_eq!(hit.body["download_count"], 2);
}

#[tokio::test]
async fn preflight_requests_get_cors_headers() {
    let app = spawn_app().await;
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/members")
        .header(header::ORIGIN, "https://club.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert!(res.status().is_success());
    assert!(res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
