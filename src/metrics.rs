//! Prometheus metrics collection for tierroute
//!
//! This module provides metrics instrumentation for tracking:
//! - Classified requests by tier and score source
//! - Classification latency
//! - Downgrades away from the top-tier model
//! - Upstream failures by status code
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::router::{ScoreSource, Tier};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector for tierroute
///
/// Cheap to clone; all collectors share one registry.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    classification_duration: HistogramVec,
    downgrades_total: IntCounter,
    upstream_failures: IntCounterVec,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 5 tiers × 4 sources, in practice 3×2 + 2
        let requests_total = IntCounterVec::new(
            Opts::new(
                "tierroute_requests_total",
                "Total number of classified requests by tier and score source",
            ),
            &["tier", "source"],
        )?;

        let classification_duration = HistogramVec::new(
            HistogramOpts::new(
                "tierroute_classification_duration_ms",
                "Classification latency in milliseconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
            &["source"],
        )?;

        let downgrades_total = IntCounter::with_opts(Opts::new(
            "tierroute_downgrades_total",
            "Requests for the top-tier model that were routed to a cheaper model",
        ))?;

        let upstream_failures = IntCounterVec::new(
            Opts::new(
                "tierroute_upstream_failures_total",
                "Upstream API failures by HTTP status code",
            ),
            &["status"],
        )?;

        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "tierroute_metrics_recording_failures_total",
                "Metrics recording operation failures by operation",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(classification_duration.clone()))?;
        registry.register(Box::new(downgrades_total.clone()))?;
        registry.register(Box::new(upstream_failures.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            classification_duration,
            downgrades_total,
            upstream_failures,
            metrics_recording_failures,
        })
    }

    /// Record a classified request
    pub fn record_request(&self, tier: Tier, source: ScoreSource) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[tier.as_str(), source.as_str()])?
            .inc();
        Ok(())
    }

    /// Record classification duration
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered or `duration_ms` is
    /// NaN, infinite or negative (such values corrupt histogram percentiles).
    pub fn record_classification_duration(
        &self,
        source: ScoreSource,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite and non-negative, got: {}",
                duration_ms
            )));
        }

        self.classification_duration
            .get_metric_with_label_values(&[source.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Record a downgrade away from the top-tier model
    pub fn record_downgrade(&self) {
        self.downgrades_total.inc();
    }

    /// Record an upstream failure
    pub fn record_upstream_failure(&self, status: u16) {
        self.upstream_failures
            .with_label_values(&[status.to_string().as_str()])
            .inc();
    }

    /// Record a metrics recording operation failure
    pub fn metrics_recording_failure(&self, operation: &str) {
        self.metrics_recording_failures
            .with_label_values(&[operation])
            .inc();
    }

    /// Total upstream failures across all status codes
    pub fn upstream_failures_count(&self) -> u64 {
        self.registry
            .gather()
            .iter()
            .find(|mf| mf.name() == "tierroute_upstream_failures_total")
            .map(|mf| {
                mf.get_metric()
                    .iter()
                    .map(|m| m.counter.value.unwrap_or(0.0) as u64)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Encode all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_families.len(),
                "Prometheus text encoder failed"
            );
            e
        })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}
