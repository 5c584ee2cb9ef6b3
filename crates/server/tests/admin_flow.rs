mod common;

use axum::http::{header, StatusCode};
use chrono::{DateTime, FixedOffset, Utc};
use common::spawn_app;
use models::news_article;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sea_orm::sea_query::Expr;
use serde_json::{json, Value};

fn member(number: &str) -> Value {
    json!({
        "membership_number": number,
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": format!("{}@club.example.org", number.to_lowercase()),
    })
}

#[tokio::test]
async fn mutations_and_failed_logins_are_audited() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let created = app.post("/api/v1/members", Some(&admin), member("A-1")).await;
    let member_id = created.body["id"].as_str().unwrap().to_string();
    app.login("admin", "definitely-wrong").await;

    let res = app.get("/api/v1/admin/audit-logs?action=create&resource_type=member", Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let row = &res.body["items"][0];
    assert_eq!(row["action"], "CREATE");
    assert_eq!(row["resource_type"], "MEMBER");
    assert_eq!(row["username"], "admin");
    assert_eq!(row["status_code"], 201);
    assert_eq!(row["success"], true);
    assert_eq!(row["client_ip"], "198.51.100.10");

    let res = app.get("/api/v1/admin/audit-logs?action=LOGIN&success=false", Some(&admin)).await;
    let row = &res.body["items"][0];
    assert_eq!(row["status_code"], 401);
    assert_eq!(row["error_message"], "invalid credentials");

    app.get(&format!("/api/v1/members/{member_id}"), Some(&admin)).await;
    let res = app.get("/api/v1/admin/audit-logs?action=READ&resource_type=MEMBER", Some(&admin)).await;
    assert_eq!(res.body["items"][0]["resource_id"], member_id.as_str());
}

#[tokio::test]
async fn audit_log_needs_audit_permission_and_purge_needs_system_manage() {
    let app = spawn_app().await;
    let editor = app.token_for("writer", &["EDITOR"]).await;
    assert_eq!(app.get("/api/v1/admin/audit-logs", Some(&editor)).await.status, StatusCode::FORBIDDEN);

    let manager = app.token_for("manager", &["ADMIN"]).await;
    assert_eq!(app.get("/api/v1/admin/audit-logs", Some(&manager)).await.status, StatusCode::OK);
    let purge = app.delete("/api/v1/admin/audit-logs?older_than_days=30", Some(&manager)).await;
    assert_eq!(purge.status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let purge = app.delete("/api/v1/admin/audit-logs?older_than_days=30", Some(&admin)).await;
    assert_eq!(purge.status, StatusCode::OK, "{}", purge.body);
    assert_eq!(purge.body["deleted"], 0);
    let zero = app.delete("/api/v1/admin/audit-logs?older_than_days=0", Some(&admin)).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_import_reports_per_item_results() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let mut bad = member("B-3");
    bad["email"] = json!("nope");
    let items = json!([member("B-1"), member("B-2"), bad, member("B-1")]);
    let res = app.post("/api/v1/admin/bulk/members/import", Some(&admin), items).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["total"], 4);
    assert_eq!(res.body["succeeded"], 2);
    assert_eq!(res.body["failed"], 2);
    assert_eq!(res.body["results"][2]["success"], false);
    assert_eq!(res.body["results"][2]["field_errors"][0]["field"], "email");

    let ids: Vec<Value> = res.body["results"].as_array().unwrap().iter().filter_map(|r| r.get("id").cloned()).collect();
    let suspended = app
        .post("/api/v1/admin/bulk/members/status", Some(&admin), json!({"ids": ids, "status": "SUSPENDED"}))
        .await;
    assert_eq!(suspended.body["affected"], 2);
    let list = app.get("/api/v1/members?status=SUSPENDED", Some(&admin)).await;
    assert_eq!(list.body["total_items"], 2);

    let deleted = app.post("/api/v1/admin/bulk/members/delete", Some(&admin), json!({"ids": ids})).await;
    assert_eq!(deleted.body["requested"], 2);
    assert_eq!(deleted.body["affected"], 2);
}

#[tokio::test]
async fn bulk_batches_are_bounded() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let empty = app.post("/api/v1/admin/bulk/members/delete", Some(&admin), json!({"ids": []})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let ids: Vec<String> = (0..501).map(|_| uuid::Uuid::new_v4().to_string()).collect();
    let res = app.post("/api/v1/admin/bulk/players/deactivate", Some(&admin), json!({"ids": ids})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let editor = app.token_for("bulk-editor", &["EDITOR"]).await;
    let res = app.post("/api/v1/admin/bulk/members/delete", Some(&editor), json!({"ids": [uuid::Uuid::new_v4()]})).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn due_articles_are_published_on_demand() {
    let app = spawn_app().await;
    let editor = app.token_for("desk", &["EDITOR"]).await;
    let created = app.post("/api/v1/news", Some(&editor), json!({"title": "Queued", "content": "Body."})).await;
    let id = created.body["id"].as_str().unwrap().to_string();
    let at = Utc::now() + chrono::Duration::hours(2);
    let res = app.post(&format!("/api/v1/news/{id}/schedule"), Some(&editor), json!({"publish_at": at})).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let queue = app.get("/api/v1/admin/news/scheduled", Some(&editor)).await;
    assert_eq!(queue.body["total_items"], 1);
    let nothing = app.post("/api/v1/admin/news/publish-due", Some(&editor), json!({})).await;
    assert_eq!(nothing.body["published"], 0);

    let due: DateTime<FixedOffset> = (Utc::now() - chrono::Duration::minutes(1)).into();
    news_article::Entity::update_many()
        .col_expr(news_article::Column::PublishAt, Expr::value(due))
        .filter(news_article::Column::Slug.eq("queued"))
        .exec(&app.state.db)
        .await
        .unwrap();
    let run = app.post("/api/v1/admin/news/publish-due", Some(&editor), json!({})).await;
    assert_eq!(run.status, StatusCode::OK);
    assert_eq!(run.body["published"], 1);
    assert_eq!(run.body["ids"][0], id.as_str());
    assert_eq!(app.get("/api/v1/news/queued", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn role_changes_respect_the_hierarchy() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let created = app
        .post(
            "/api/v1/admin/users",
            Some(&admin),
            json!({"username": "kim", "email": "kim@club.example.org", "full_name": "Kim", "password": "UserPass123"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["roles"], json!(["USER"]));
    let kim = created.body["id"].as_str().unwrap().to_string();

    let promoted = app.put(&format!("/api/v1/admin/users/{kim}/roles"), Some(&admin), json!({"roles": ["EDITOR"]})).await;
    assert_eq!(promoted.status, StatusCode::OK, "{}", promoted.body);
    assert_eq!(promoted.body["roles"], json!(["EDITOR"]));

    let unknown = app.put(&format!("/api/v1/admin/users/{kim}/roles"), Some(&admin), json!({"roles": ["WIZARD"]})).await;
    assert!(unknown.status.is_client_error());

    let manager = app.token_for("deputy", &["ADMIN"]).await;
    let escalate = app.post(
        "/api/v1/admin/users",
        Some(&manager),
        json!({"username": "sneaky", "email": "sneaky@club.example.org", "full_name": "S", "password": "UserPass123", "roles": ["ADMIN"]}),
    )
    .await;
    assert_eq!(escalate.status, StatusCode::FORBIDDEN);

    let reset = app.post(&format!("/api/v1/admin/users/{kim}/password"), Some(&admin), json!({})).await;
    assert_eq!(reset.status, StatusCode::OK, "{}", reset.body);
    let temp = reset.body["temporary_password"].as_str().unwrap().to_string();
    assert_eq!(app.login("kim", "UserPass123").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("kim", &temp).await.status, StatusCode::OK);

    let me = app.get("/api/v1/auth/me", Some(&admin)).await;
    let admin_id = me.body["id"].as_str().unwrap().to_string();
    let self_delete = app.delete(&format!("/api/v1/admin/users/{admin_id}"), Some(&admin)).await;
    assert_eq!(self_delete.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn system_endpoints() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let health = app.get("/api/v1/admin/system/health", Some(&admin)).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "UP");
    assert_eq!(health.body["database"]["up"], true);

    let metrics = app.get("/api/v1/admin/system/metrics", Some(&admin)).await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(metrics.headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap().starts_with("text/plain"));

    let clear = app.post("/api/v1/admin/system/cache/clear", Some(&admin), json!({})).await;
    assert_eq!(clear.status, StatusCode::OK);

    let viewer = app.token_for("plain", &["USER"]).await;
    assert_eq!(app.get("/api/v1/admin/system/health", Some(&viewer)).await.status, StatusCode::FORBIDDEN);
}
