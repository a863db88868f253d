/// Metrics and telemetry for the moderation service
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Moderation actions by audit topic
/// - Cancelled and conflicting actions
/// - Audit log and flag searches

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    /// Active HTTP requests
    pub static ref HTTP_REQUESTS_ACTIVE: IntGauge = register_int_gauge!(
        "http_requests_active",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // ========== Moderation Metrics ==========

    /// Committed moderation actions by audit topic
    pub static ref MODERATION_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "moderation_actions_total",
        "Total number of committed moderation actions",
        &["topic"]
    )
    .unwrap();

    /// Destructive actions submitted without confirmation
    pub static ref MODERATION_CANCELLED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "moderation_cancelled_total",
        "Total number of unconfirmed moderation actions",
        &["operation"]
    )
    .unwrap();

    /// Actions rejected by a uniqueness conflict
    pub static ref MODERATION_CONFLICTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "moderation_conflicts_total",
        "Total number of moderation actions rejected as conflicts",
        &["operation"]
    )
    .unwrap();

    // ========== Search Metrics ==========

    /// Searches by collection
    pub static ref SEARCH_QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "search_queries_total",
        "Total number of audit log and flag searches",
        &["collection"]
    )
    .unwrap();

    /// Searches that failed and were degraded to an empty page
    pub static ref SEARCH_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "search_failures_total",
        "Total number of failed searches",
        &["collection"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a committed moderation action
pub fn record_moderation_action(topic: &str) {
    MODERATION_ACTIONS_TOTAL.with_label_values(&[topic]).inc();
}

/// Record an unconfirmed destructive action
pub fn record_cancelled_action(operation: &str) {
    MODERATION_CANCELLED_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Record a uniqueness conflict
pub fn record_conflict(operation: &str) {
    MODERATION_CONFLICTS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Record a search
pub fn record_search(collection: &str) {
    SEARCH_QUERIES_TOTAL.with_label_values(&[collection]).inc();
}

/// Record a failed search
pub fn record_search_failure(collection: &str) {
    SEARCH_FAILURES_TOTAL.with_label_values(&[collection]).inc();
}
