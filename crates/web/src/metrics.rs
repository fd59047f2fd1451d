use anyhow::Result;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn describe() {
    describe_gauge!(
        "portfolio_web_build_info",
        "Build info for the portfolio API (value is always 1)."
    );
    describe_counter!(
        "portfolio_upstream_requests_total",
        "Sei REST requests by endpoint and status (ok/error)."
    );
    describe_counter!(
        "portfolio_upstream_errors_total",
        "Failed Sei REST requests by endpoint and error kind."
    );
    describe_histogram!(
        "portfolio_upstream_latency_ms",
        "Sei REST request latency in milliseconds."
    );
    describe_counter!(
        "portfolio_snapshots_total",
        "Portfolio lookups by outcome (built/api_fallback/request_fallback)."
    );
    describe_counter!(
        "portfolio_llm_requests_total",
        "Chat completion requests by insight kind and status."
    );
    describe_counter!(
        "portfolio_mood_fallbacks_total",
        "Mood answers that were not valid JSON and were replaced."
    );
    describe_counter!(
        common::observability::ERROR_EVENTS_METRIC,
        "Count of tracing events at ERROR level."
    );
}

/// Install the global Prometheus recorder once and return a handle for `/metrics`.
///
/// `install_recorder` leaves upkeep to the caller; the `/metrics` handler runs it.
pub fn init_global() -> Result<PrometheusHandle> {
    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    let handle = PROM_HANDLE.get_or_init(|| handle);

    let git_sha = std::env::var("GIT_SHA").unwrap_or_else(|_| "unknown".to_string());
    ::metrics::gauge!(
        "portfolio_web_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
        "git_sha" => git_sha,
    )
    .set(1.0);

    Ok(handle.clone())
}
