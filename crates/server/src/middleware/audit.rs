use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use service::authz::Principal;
use service::services::audit::{self, AuditEntry};
use tracing::warn;

use crate::errors::ErrorEnvelope;
use crate::extract::{client_ip, request_path};
use crate::metrics;
use crate::state::ServerState;

/// Times every API call, records request metrics and writes one audit row.
///
/// The principal comes from the response extensions set by the auth layer,
/// so rejected tokens are audited as anonymous calls. Audit failures are
/// logged and never change the response.
pub async fn audit(State(state): State<ServerState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = request_path(&req);
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ip = client_ip(req.headers(), req.extensions());

    let res = next.run(req).await;

    let elapsed = started.elapsed();
    let status = res.status().as_u16();
    metrics::observe_request(method.as_str(), status, elapsed.as_secs_f64());

    let cfg = &state.config.audit;
    let is_read = method == Method::GET || method == Method::HEAD;
    if !cfg.enabled || method == Method::OPTIONS || (is_read && !cfg.include_reads) {
        return res;
    }

    let principal = res.extensions().get::<Principal>();
    let entry = AuditEntry {
        user_id: principal.map(|p| p.user_id),
        username: principal.map(|p| p.username.clone()),
        http_method: method.to_string(),
        path,
        status_code: status,
        duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        client_ip: ip,
        user_agent,
        error_message: res.extensions().get::<ErrorEnvelope>().map(|e| e.message.clone()),
    };
    if let Err(e) = audit::record(&state.db, entry).await {
        metrics::AUDIT_WRITE_FAILURES_TOTAL.inc();
        warn!(error = %e, "audit write failed");
    }
    res
}
