//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Content server requests and retries
//! - Save / add-version triggers

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Content Server
// =============================================================================

/// Content server requests by endpoint and result.
pub static CONTENT_SERVER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "redline_content_server_requests_total",
            "Total content server requests",
        ),
        &["endpoint", "result"], // endpoint: "auth", "content", "versions"
    )
    .unwrap()
});

/// Retries issued after a failed content server request.
pub static CONTENT_SERVER_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "redline_content_server_retries_total",
            "Total content server request retries",
        ),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Triggers
// =============================================================================

/// Triggers by kind and outcome.
pub static TRIGGERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("redline_triggers_total", "Total save / add-version triggers"),
        &["trigger", "result"], // result: "succeeded", "failed", "cancelled"
    )
    .unwrap()
});

/// Trigger duration in seconds.
pub static TRIGGER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "redline_trigger_duration_seconds",
            "Duration of export, serialization and upload per trigger",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["trigger"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONTENT_SERVER_REQUESTS.clone()),
        Box::new(CONTENT_SERVER_RETRIES.clone()),
        Box::new(TRIGGERS_TOTAL.clone()),
        Box::new(TRIGGER_DURATION.clone()),
    ]
}
