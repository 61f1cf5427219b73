use anyhow::Result;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Histogram bucket boundaries for dispatch latency (seconds). Dispatch
/// itself is in-process, so the buckets start well below a millisecond.
const LATENCY_BUCKETS: &[f64] = &[
    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
];

/// Thin handle around the global metrics recorder.
///
/// After `Metrics::install()` the `metrics` crate macros (`counter!`,
/// `histogram!`) used by the router and dispatcher are recorded. The
/// `PrometheusHandle` is retained solely for rendering.
#[derive(Clone)]
pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and register metric descriptions.
    ///
    /// Must be called **once**, before routes are registered.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("_duration_seconds".to_string()),
                LATENCY_BUCKETS,
            )?
            .install_recorder()?;

        describe_counter!(
            "dispatch_requests_total",
            Unit::Count,
            "Total requests dispatched, by terminal state"
        );
        describe_histogram!(
            "dispatch_duration_seconds",
            Unit::Seconds,
            "Time from lookup to committed response"
        );
        describe_counter!(
            "routing_routes_registered_total",
            Unit::Count,
            "Routes successfully registered"
        );

        Ok(Self { handle })
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
