use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "edulib_http_requests_total",
        "Total HTTP requests received"
    )
    .expect("register http_requests_total")
});

pub static HTTP_SERVER_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "edulib_http_server_errors_total",
        "Total responses with a 5xx status"
    )
    .expect("register http_server_errors_total")
});

pub static UPLOADS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "edulib_uploads_total",
        "Total files stored"
    )
    .expect("register uploads_total")
});

pub static DOWNLOADS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "edulib_downloads_total",
        "Total counted downloads"
    )
    .expect("register downloads_total")
});

pub static LOGIN_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "edulib_login_failures_total",
        "Total rejected login attempts"
    )
    .expect("register login_failures_total")
});

pub async fn track_requests(req: Request, next: Next) -> Response {
    HTTP_REQUESTS_TOTAL.inc();
    let resp = next.run(req).await;
    if resp.status().is_server_error() {
        HTTP_SERVER_ERRORS_TOTAL.inc();
    }
    resp
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

#[utoipa::path(get, path = "/metrics", tag = "health", responses((status = 200, description = "Prometheus text format")))]
pub async fn metrics() -> (StatusCode, String) {
    encode_metrics()
}
