//! Gate metrics
//!
//! Counters and histograms are emitted with the `metrics` facade at the
//! point where each decision is made:
//!
//! - `gate_calls_total{outcome}`: tool calls by gate outcome
//! - `logins_total{result}`: web login completions by result
//! - `data_provider_duration_seconds{tool}`: data provider latency
//!
//! Without an installed recorder the macros are no-ops.

use metrics::{describe_counter, describe_histogram, Unit};

/// Registers descriptions for every metric the gate emits.
pub fn describe_metrics() {
    describe_counter!("gate_calls_total", "Tool calls by gate outcome");
    describe_counter!("logins_total", "Web login completions by result");
    describe_histogram!(
        "data_provider_duration_seconds",
        Unit::Seconds,
        "Time spent producing a tool payload"
    );
}

/// Initializes the metrics exporter for Prometheus
///
/// When the `prometheus` feature is enabled, this installs the Prometheus
/// exporter on its default listener. Otherwise it does nothing.
///
/// # Examples
///
/// ```
/// use toolgate::telemetry::init_metrics_exporter;
///
/// init_metrics_exporter();
/// ```
pub fn init_metrics_exporter() {
    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let _ = builder.install().map_err(|e| {
            tracing::warn!("Failed to install Prometheus exporter: {}", e);
        });
    }
    describe_metrics();
}
