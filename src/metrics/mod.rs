//! Metrics module
//!
//! Provides Prometheus metrics for uploads and source reads.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "upstow_uploads_total",
        "Total number of uploads",
        &["source", "status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "upstow_upload_bytes_total",
        "Total bytes uploaded from in-memory sources"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "upstow_upload_duration_seconds",
        "Drive write duration in seconds",
        &["drive"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    ).unwrap();

    // Source metrics
    pub static ref SOURCE_ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "upstow_source_errors_total",
        "Source read failures",
        &["kind"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(source: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[source, "success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed upload
pub fn record_upload_failure(source: &str) {
    UPLOADS_TOTAL.with_label_values(&[source, "failure"]).inc();
}

/// Record drive write duration
pub fn record_upload_duration(drive: &str, duration_secs: f64) {
    UPLOAD_DURATION
        .with_label_values(&[drive])
        .observe(duration_secs);
}

/// Record a source read failure
pub fn record_source_error(kind: &str) {
    SOURCE_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

/// Render all registered metrics in the Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
