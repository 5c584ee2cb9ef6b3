use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec, IntCounter,
    IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "association_http_requests_total",
        "API requests by method and status class",
        &["method", "status"]
    )
    .expect("register http_requests_total")
});

pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "association_http_request_duration_seconds",
        "API request duration in seconds",
        &["method"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("register http_request_duration")
});

pub static AUDIT_WRITE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "association_audit_write_failures_total",
        "Audit rows that could not be persisted"
    )
    .expect("register audit_write_failures_total")
});

pub static LOGIN_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("association_login_failures_total", "Rejected login attempts")
        .expect("register login_failures_total")
});

pub static RATE_LIMITED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "association_rate_limited_total",
        "Requests rejected by the login rate limiter"
    )
    .expect("register rate_limited_total")
});

/// `2xx`, `4xx`, ... label for a status code.
pub fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

pub fn observe_request(method: &str, status: u16, seconds: f64) {
    HTTP_REQUESTS_TOTAL.with_label_values(&[method, status_class(status)]).inc();
    HTTP_REQUEST_DURATION.with_label_values(&[method]).observe(seconds);
}

/// Forces registration so every series shows up on the first scrape.
pub fn init() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&AUDIT_WRITE_FAILURES_TOTAL);
    Lazy::force(&LOGIN_FAILURES_TOTAL);
    Lazy::force(&RATE_LIMITED_TOTAL);
}

pub fn encode_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).map_err(|e| format!("metrics encode error: {e}"))?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}
