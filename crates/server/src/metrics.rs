//! Prometheus metrics for the fetcharr server.
//!
//! HTTP-level metrics live here; the core crate registers its own
//! engine, tracker and import metrics into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetcharr_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetcharr_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
    ];
    for collector in collectors
        .into_iter()
        .chain(fetcharr_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(collector) {
            warn!("failed to register metric: {e}");
        }
    }
}

/// Normalize a path for metric labels, replacing numeric ids so the
/// label set stays bounded.
pub fn normalize_path(path: &str) -> String {
    static ID_RE: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());
    ID_RE.replace_all(path, "/{id}$1").to_string()
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("failed to encode metrics: {e}");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_numeric_ids() {
        assert_eq!(normalize_path("/api/v1/media/42"), "/api/v1/media/{id}");
        assert_eq!(
            normalize_path("/api/v1/media/42/override"),
            "/api/v1/media/{id}/override"
        );
        assert_eq!(normalize_path("/api/v1/presets"), "/api/v1/presets");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/v1/health", "200"])
            .inc();
        let output = encode_metrics();
        assert!(output.contains("fetcharr_http_requests_total"));
    }
}
