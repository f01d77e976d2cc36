//! # Internal Metrics
//!
//! Registers metric descriptions and installs the Prometheus recorder. The
//! rendered exposition is served by the HTTP boundary on `/metrics`.
//!
//! Counters are recorded through the `metrics` macros at the call site. With
//! no recorder installed (metrics disabled, or in tests) they are no-ops.

use anyhow::Result;
use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Registers descriptions for every metric the service emits.
pub fn describe() {
    metrics::describe_counter!(
        "webhook_requests_total",
        Unit::Count,
        "Total number of webhook requests received, labeled by outcome."
    );
    metrics::describe_counter!(
        "payloads_classified_total",
        Unit::Count,
        "Total number of payloads classified, labeled by the matched schema."
    );
    metrics::describe_counter!(
        "notifications_delivered_total",
        Unit::Count,
        "Total number of notifications successfully delivered, labeled by source."
    );
    metrics::describe_counter!(
        "delivery_failures_total",
        Unit::Count,
        "Total number of failed webhook deliveries, labeled by source."
    );
}

/// Installs the global Prometheus recorder and returns a handle for
/// rendering. Fails if a recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    Ok(handle)
}

/// Increments the request counter for `outcome`.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("webhook_requests_total", "outcome" => outcome).increment(1);
}
