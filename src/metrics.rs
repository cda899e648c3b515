//! Prometheus-compatible metrics for the contrarx service.

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get or initialize the global metrics instance.
pub fn get_metrics() -> Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new())).clone()
}

/// Latency buckets from 1ms to 30s; external calls dominate the tail.
fn latency_buckets() -> Vec<f64> {
    vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
}

/// All metrics for the contrarx service.
pub struct Metrics {
    /// Prometheus registry for all metrics.
    pub registry: Registry,

    /// Resolutions served from the store.
    pub drug_cache_hits_total: IntCounter,
    /// Resolutions that fell back to the external source.
    pub drug_cache_misses_total: IntCounter,
    /// Resolutions with no local or external match.
    pub drug_not_found_total: IntCounter,
    /// Transient drug-source failures.
    pub source_errors_total: IntCounter,
    /// Pair verdicts served from the store.
    pub verdict_cache_hits_total: IntCounter,
    /// Reasoning service calls issued.
    pub reasoning_calls_total: IntCounter,
    /// Reasoning calls that failed at the transport level.
    pub reasoning_failures_total: IntCounter,

    /// Resolution duration in seconds.
    pub resolve_duration_seconds: Histogram,
    /// Batch analysis duration in seconds.
    pub analyze_duration_seconds: Histogram,

    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("valid counter definition");
    registry.register(Box::new(counter.clone())).ok();
    counter
}

fn register_histogram(registry: &Registry, name: &str, help: &str) -> Histogram {
    let histogram =
        Histogram::with_opts(HistogramOpts::new(name, help).buckets(latency_buckets()))
            .expect("valid histogram definition");
    registry.register(Box::new(histogram.clone())).ok();
    histogram
}

impl Metrics {
    /// Create a new metrics instance with all metrics registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let drug_cache_hits_total = register_counter(
            &registry,
            "contrarx_drug_cache_hits_total",
            "Resolutions served from the store",
        );
        let drug_cache_misses_total = register_counter(
            &registry,
            "contrarx_drug_cache_misses_total",
            "Resolutions that fell back to the external source",
        );
        let drug_not_found_total = register_counter(
            &registry,
            "contrarx_drug_not_found_total",
            "Resolutions with no local or external match",
        );
        let source_errors_total = register_counter(
            &registry,
            "contrarx_source_errors_total",
            "Transient drug source failures",
        );
        let verdict_cache_hits_total = register_counter(
            &registry,
            "contrarx_verdict_cache_hits_total",
            "Pair verdicts served from the store",
        );
        let reasoning_calls_total = register_counter(
            &registry,
            "contrarx_reasoning_calls_total",
            "Reasoning service calls issued",
        );
        let reasoning_failures_total = register_counter(
            &registry,
            "contrarx_reasoning_failures_total",
            "Reasoning calls that failed at the transport level",
        );
        let resolve_duration_seconds = register_histogram(
            &registry,
            "contrarx_resolve_duration_seconds",
            "Drug resolution duration in seconds",
        );
        let analyze_duration_seconds = register_histogram(
            &registry,
            "contrarx_analyze_duration_seconds",
            "Batch analysis duration in seconds",
        );

        Self {
            registry,
            drug_cache_hits_total,
            drug_cache_misses_total,
            drug_not_found_total,
            source_errors_total,
            verdict_cache_hits_total,
            reasoning_calls_total,
            reasoning_failures_total,
            resolve_duration_seconds,
            analyze_duration_seconds,
            start_time: Instant::now(),
        }
    }

    /// Seconds since the metrics instance was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            drug_cache_hits: self.drug_cache_hits_total.get(),
            drug_cache_misses: self.drug_cache_misses_total.get(),
            drug_not_found: self.drug_not_found_total.get(),
            source_errors: self.source_errors_total.get(),
            verdict_cache_hits: self.verdict_cache_hits_total.get(),
            reasoning_calls: self.reasoning_calls_total.get(),
            reasoning_failures: self.reasoning_failures_total.get(),
            uptime_seconds: self.uptime_seconds(),
        }
    }
}

/// Serializable counter snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub drug_cache_hits: u64,
    pub drug_cache_misses: u64,
    pub drug_not_found: u64,
    pub source_errors: u64,
    pub verdict_cache_hits: u64,
    pub reasoning_calls: u64,
    pub reasoning_failures: u64,
    pub uptime_seconds: u64,
}
