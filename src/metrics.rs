// Prometheus metrics definitions for the wow-tools backend.

use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::LookupError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Upstream API calls, by service (raiderio, warcraftlogs) and outcome.
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("wowtools_upstream_requests_total", "Total upstream API requests"),
        &["service", "outcome"],
    )
    .unwrap();

    /// Alt-candidate lookups, by outcome (found, missing, timeout).
    pub static ref WARBAND_CANDIDATES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("wowtools_warband_candidates_total", "Alt candidate lookups"),
        &["outcome"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Upstream request duration in seconds, by service.
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "wowtools_upstream_request_duration_seconds",
            "Upstream request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["service"],
    )
    .unwrap();

    /// Characters discovered per warband analysis.
    pub static ref WARBAND_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new("wowtools_warband_size", "Characters found per warband analysis")
            .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]),
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(UPSTREAM_REQUESTS_TOTAL.clone()),
        Box::new(WARBAND_CANDIDATES_TOTAL.clone()),
        Box::new(UPSTREAM_REQUEST_DURATION_SECONDS.clone()),
        Box::new(WARBAND_SIZE.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Metric registration skipped: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Label for an upstream call result.
pub fn outcome_label<T>(result: &Result<T, LookupError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(LookupError::NotFound(_)) => "not_found",
        Err(LookupError::InvalidInput(_)) => "invalid",
        Err(LookupError::Service(_)) | Err(LookupError::Unavailable(_)) => "error",
    }
}

/// Count and time one upstream call.
pub fn record_upstream<T>(service: &str, result: &Result<T, LookupError>, elapsed: Duration) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[service, outcome_label(result)])
        .inc();
    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[service])
        .observe(elapsed.as_secs_f64());
}
