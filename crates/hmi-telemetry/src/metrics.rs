//! Prometheus metrics for the telemetry middleware.
//!
//! All metrics follow the naming convention: `hmi_<component>_<metric>_<unit>`
//!
//! Metrics can be recorded before `register_metrics` runs; registration only
//! makes them visible to `encode_metrics`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISTRIBUTION HUB
    // =========================================================================

    /// Envelopes accepted by the hub, by origin (publish/inject)
    pub static ref ENVELOPES_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("hmi_hub_envelopes_published_total", "Envelopes accepted by the hub"),
        &["origin"]
    ).expect("metric creation failed");

    /// Subscribers dropped after a failed delivery
    pub static ref SUBSCRIBERS_EVICTED: IntCounter = IntCounter::new(
        "hmi_hub_subscribers_evicted_total",
        "Subscribers removed after a transport failure during fan-out"
    ).expect("metric creation failed");

    /// Currently registered subscribers
    pub static ref SUBSCRIBERS_ACTIVE: Gauge = Gauge::new(
        "hmi_hub_subscribers_active",
        "Number of registered subscribers"
    ).expect("metric creation failed");

    /// Time spent delivering one envelope to every subscriber
    pub static ref FANOUT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "hmi_hub_fanout_duration_seconds",
            "Time spent fanning one envelope out to all subscribers"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // WIRE CODEC
    // =========================================================================

    /// Inbound messages dropped because they did not decode
    pub static ref DECODE_FAILURES: CounterVec = CounterVec::new(
        Opts::new("hmi_wire_decode_failures_total", "Inbound messages that failed to decode"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // SCHEMA REGISTRY
    // =========================================================================

    /// Schema reload attempts by outcome (applied/rejected)
    pub static ref SCHEMA_RELOADS: CounterVec = CounterVec::new(
        Opts::new("hmi_schema_reloads_total", "Schema reload attempts"),
        &["outcome"]
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Hub
        Box::new(ENVELOPES_PUBLISHED.clone()),
        Box::new(SUBSCRIBERS_EVICTED.clone()),
        Box::new(SUBSCRIBERS_ACTIVE.clone()),
        Box::new(FANOUT_DURATION.clone()),
        // Wire
        Box::new(DECODE_FAILURES.clone()),
        // Schema
        Box::new(SCHEMA_RELOADS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
