//! Prometheus metrics for the flagger server.
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus
//! scraping; restrict it to scraper IPs at the infrastructure level
//! when enabled.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// File listing requests, by kind and selection mode.
pub static FILE_LISTINGS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "flagger_file_listings_total",
            "Total file listing requests served",
        ),
        &["kind", "mode"],
    )
    .expect("metric creation failed")
});

/// Work-zone group fetches, by kind.
pub static GROUP_FETCHES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "flagger_group_fetches_total",
            "Total work-zone group fetch requests served",
        ),
        &["kind"],
    )
    .expect("metric creation failed")
});

/// Rejected requests, by reason (missing vs. invalid key).
pub static AUTH_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "flagger_auth_failures_total",
            "Total requests rejected by the authentication gate",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

/// Center strings that failed to parse while a distance was requested.
///
/// The request still succeeds (the distance filter is silently not
/// applied, matching the source system); this counter makes the
/// degradation observable.
pub static MALFORMED_CENTER_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "flagger_malformed_center_total",
        "Distance-filtered listings that fell back to unfiltered because the center string was malformed",
    )
    .expect("metric creation failed")
});

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry. Idempotent.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(FILE_LISTINGS_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(GROUP_FETCHES_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(MALFORMED_CENTER_TOTAL.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }

    match String::from_utf8(buffer) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::error!(error = %e, "metrics output was not UTF-8");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}
