//! Prometheus metrics for studio-service.
//!
//! Exposes publishing and HTTP collectors and the handler for the `/metrics`
//! endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// HTTP requests segmented by method and response status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "studio_http_requests_total",
        "HTTP requests segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register studio_http_requests_total");

    /// HTTP request duration segmented by method.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "studio_http_request_duration_seconds",
        "HTTP request duration segmented by method",
        &["method"]
    )
    .expect("failed to register studio_http_request_duration_seconds");

    /// Per-target dispatch results segmented by platform and outcome.
    pub static ref PUBLISH_DISPATCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "studio_publish_dispatch_total",
        "Publish dispatch attempts segmented by platform and outcome",
        &["platform", "outcome"]
    )
    .expect("failed to register studio_publish_dispatch_total");

    /// Scheduled publisher poll results (claimed items, errors).
    pub static ref SCHEDULER_POLL_TOTAL: IntCounterVec = register_int_counter_vec!(
        "studio_scheduler_poll_total",
        "Scheduled publisher polls segmented by result",
        &["result"]
    )
    .expect("failed to register studio_scheduler_poll_total");

    /// Cache events (hit/miss/error) segmented by entity.
    pub static ref CACHE_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "studio_cache_events_total",
        "Cache events segmented by entity and outcome",
        &["entity", "event"]
    )
    .expect("failed to register studio_cache_events_total");
}

pub fn record_http_request(method: &str, status: u16, seconds: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(seconds);
}

pub fn record_dispatch(platform: &str, success: bool) {
    let outcome = if success { "published" } else { "failed" };
    PUBLISH_DISPATCH_TOTAL
        .with_label_values(&[platform, outcome])
        .inc();
}

pub fn record_scheduler_poll(result: &str) {
    SCHEDULER_POLL_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_cache_event(entity: &str, event: &str) {
    CACHE_EVENTS_TOTAL.with_label_values(&[entity, event]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
