//! Audit trail: action/resource inference from requests, persistence, queries and retention.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::audit_log;

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};

pub const API_PREFIX: &str = "/api/v1";

/// Segments that group endpoints without naming a resource.
const GROUPING_SEGMENTS: [&str; 2] = ["admin", "bulk"];

/// Maps a request to its audit action.
///
/// ```
/// use service::services::audit::infer_action;
/// assert_eq!(infer_action("POST", "/api/v1/members"), "CREATE");
/// assert_eq!(infer_action("POST", "/api/v1/admin/bulk/members/import"), "BULK_IMPORT");
/// assert_eq!(infer_action("PUT", "/api/v1/admin/users/7/roles"), "ROLE_ASSIGN");
/// ```
pub fn infer_action(method: &str, path: &str) -> String {
    let segments = segments(path);
    if segments.first() == Some(&"auth") {
        match segments.get(1).copied() {
            Some("login") => return "LOGIN".into(),
            Some("logout") => return "LOGOUT".into(),
            Some("refresh") => return "TOKEN_REFRESH".into(),
            _ => {}
        }
    }
    if segments.contains(&"bulk") {
        if let Some(op) = segments.last() {
            return format!("BULK_{}", op.to_ascii_uppercase().replace('-', "_"));
        }
    }
    match segments.last().copied() {
        Some("publish") | Some("publish-due") => return "PUBLISH".into(),
        Some("roles") => return "ROLE_ASSIGN".into(),
        Some("schedule") | Some("archive") | Some("password") => return "UPDATE".into(),
        Some("hit") => return "READ".into(),
        Some("clear") => return "DELETE".into(),
        _ => {}
    }
    match method.to_ascii_uppercase().as_str() {
        "POST" => "CREATE",
        "PUT" | "PATCH" => "UPDATE",
        "DELETE" => "DELETE",
        _ => "READ",
    }
    .into()
}

/// Resource type (upper-cased singular) and optional id of a request path.
///
/// ```
/// use service::services::audit::infer_resource;
/// let id = "5f0e3c4e-8d5b-4a63-9d7e-3b1c9a1f2e11";
/// assert_eq!(infer_resource(&format!("/api/v1/members/{id}")), ("MEMBER".into(), Some(id.into())));
/// assert_eq!(infer_resource("/api/v1/admin/audit-logs"), ("AUDIT_LOG".into(), None));
/// ```
pub fn infer_resource(path: &str) -> (String, Option<String>) {
    let segments = segments(path);
    let mut rest = segments.iter().skip_while(|s| GROUPING_SEGMENTS.contains(s));
    let Some(resource) = rest.next() else {
        return ("UNKNOWN".into(), None);
    };
    let id = rest
        .next()
        .filter(|s| Uuid::parse_str(s).is_ok() || s.parse::<i64>().is_ok())
        .map(|s| s.to_string());
    (singular(resource).to_ascii_uppercase().replace('-', "_"), id)
}

fn segments(path: &str) -> Vec<&str> {
    let path = path.split('?').next().unwrap_or_default();
    let path = path.strip_prefix(API_PREFIX).unwrap_or(path);
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn singular(word: &str) -> String {
    match word {
        "news" | "media" | "auth" | "system" => word.to_string(),
        w if w.ends_with("ies") => format!("{}y", &w[..w.len() - 3]),
        w if w.ends_with('s') && !w.ends_with("ss") => w[..w.len() - 1].to_string(),
        w => w.to_string(),
    }
}

/// One request outcome to persist.
#[derive(Debug, Clone, Default)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub http_method: String,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
}

pub async fn record(db: &DatabaseConnection, entry: AuditEntry) -> Result<audit_log::Model, ServiceError> {
    let (resource_type, resource_id) = infer_resource(&entry.path);
    let model = audit_log::Model {
        id: Uuid::new_v4(),
        user_id: entry.user_id,
        username: entry.username,
        action: infer_action(&entry.http_method, &entry.path),
        resource_type,
        resource_id,
        http_method: entry.http_method.to_ascii_uppercase(),
        path: entry.path,
        status_code: i32::from(entry.status_code),
        success: entry.status_code < 400,
        duration_ms: i64::try_from(entry.duration_ms).unwrap_or(i64::MAX),
        client_ip: entry.client_ip,
        user_agent: entry.user_agent,
        error_message: entry.error_message,
        created_at: Utc::now().into(),
    };
    Ok(audit_log::create(db, model).await?)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub user_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub success: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Newest first.
pub async fn query(db: &DatabaseConnection, filter: AuditFilter, pagination: Pagination) -> Result<Page<audit_log::Model>, ServiceError> {
    let mut select = audit_log::Entity::find();
    if let Some(user_id) = filter.user_id {
        select = select.filter(audit_log::Column::UserId.eq(user_id));
    }
    if let Some(action) = filter.action {
        select = select.filter(audit_log::Column::Action.eq(action.to_ascii_uppercase()));
    }
    if let Some(resource_type) = filter.resource_type {
        select = select.filter(audit_log::Column::ResourceType.eq(resource_type.to_ascii_uppercase()));
    }
    if let Some(success) = filter.success {
        select = select.filter(audit_log::Column::Success.eq(success));
    }
    if let Some(from) = filter.from {
        select = select.filter(audit_log::Column::CreatedAt.gte(from));
    }
    if let Some(to) = filter.to {
        select = select.filter(audit_log::Column::CreatedAt.lte(to));
    }
    let select = select.order_by_desc(audit_log::Column::CreatedAt);
    Ok(fetch_page(db, select, pagination).await?)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurgeResult {
    pub deleted: u64,
    pub cutoff: DateTime<Utc>,
}

/// Deletes entries older than `days` days.
#[instrument(skip(db))]
pub async fn purge_older_than(db: &DatabaseConnection, days: u32) -> Result<PurgeResult, ServiceError> {
    if days == 0 {
        return Err(ServiceError::Validation("older_than_days must be at least 1".into()));
    }
    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let res = audit_log::Entity::delete_many()
        .filter(audit_log::Column::CreatedAt.lt(cutoff))
        .exec(db)
        .await?;
    info!(deleted = res.rows_affected, %cutoff, "audit_log_purged");
    Ok(PurgeResult { deleted: res.rows_affected, cutoff })
}
