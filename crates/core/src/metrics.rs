//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Grab decision engine (searches, grabs, rejections, deferrals)
//! - Download tracker (completions, failures, stalls)
//! - Import pipeline

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Grab Decision Engine Metrics
// =============================================================================

/// Search passes total by kind.
pub static SEARCH_PASSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetcharr_search_passes_total", "Total search passes"),
        &["kind"], // "search", "upgrade"
    )
    .unwrap()
});

/// Candidates returned per decision pass.
pub static CANDIDATES_FOUND: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetcharr_candidates_found",
            "Number of candidates found per decision pass",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &[],
    )
    .unwrap()
});

/// Candidates rejected total by stage.
pub static CANDIDATES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fetcharr_candidates_rejected_total",
            "Total candidates rejected",
        ),
        &["stage"], // "trust", "score"
    )
    .unwrap()
});

/// Grabs total by path.
pub static GRABS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetcharr_grabs_total", "Total grabs submitted to clients"),
        &["path"], // "immediate", "promoted"
    )
    .unwrap()
});

/// Grabs deferred by a delay profile.
pub static GRABS_DEFERRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetcharr_grabs_deferred_total",
        "Total grabs deferred by a delay profile",
    )
    .unwrap()
});

// =============================================================================
// Download Tracker Metrics
// =============================================================================

/// Downloads completed total.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetcharr_downloads_completed_total",
        "Total downloads completed by a client",
    )
    .unwrap()
});

/// Downloads failed total.
pub static DOWNLOADS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetcharr_downloads_failed_total",
        "Total downloads that failed",
    )
    .unwrap()
});

/// Stall detections total.
pub static STALL_DETECTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetcharr_stall_detections_total",
        "Total download stall detections",
    )
    .unwrap()
});

// =============================================================================
// Import Pipeline Metrics
// =============================================================================

/// Imports total by result.
pub static IMPORTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetcharr_imports_total", "Total import attempts"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCH_PASSES.clone()),
        Box::new(CANDIDATES_FOUND.clone()),
        Box::new(CANDIDATES_REJECTED.clone()),
        Box::new(GRABS_TOTAL.clone()),
        Box::new(GRABS_DEFERRED.clone()),
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(DOWNLOADS_FAILED.clone()),
        Box::new(STALL_DETECTIONS.clone()),
        Box::new(IMPORTS_TOTAL.clone()),
    ]
}
