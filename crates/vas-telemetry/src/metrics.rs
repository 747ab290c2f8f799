//! Prometheus metrics for the runtime.
//!
//! All metrics follow the naming convention: `vas_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: monotonically increasing (navigations, published events)
//! - **Gauge**: goes up and down (running controllers)

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Metrics registry private to the runtime
    pub static ref REGISTRY: Registry = Registry::new();

    /// Successful navigations
    pub static ref NAVIGATIONS: IntCounter = IntCounter::new(
        "vas_navigations_total",
        "Total number of successful screen navigations"
    ).expect("metric creation failed");

    /// Failed navigations
    pub static ref NAVIGATION_FAILURES: IntCounter = IntCounter::new(
        "vas_navigation_failures_total",
        "Total number of navigations aborted by a state load error"
    ).expect("metric creation failed");

    /// Events published on the broker
    pub static ref EVENTS_PUBLISHED: IntCounter = IntCounter::new(
        "vas_events_published_total",
        "Total number of events published on the events broker"
    ).expect("metric creation failed");

    /// Broker handler failures
    pub static ref HANDLER_FAILURES: IntCounter = IntCounter::new(
        "vas_handler_failures_total",
        "Total number of failed or panicking event handlers"
    ).expect("metric creation failed");

    /// Controllers currently started
    pub static ref ACTIVE_CONTROLLERS: IntGauge = IntGauge::new(
        "vas_active_controllers",
        "Number of controllers currently started"
    ).expect("metric creation failed");
}

/// Register every metric with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(NAVIGATIONS.clone()),
        Box::new(NAVIGATION_FAILURES.clone()),
        Box::new(EVENTS_PUBLISHED.clone()),
        Box::new(HANDLER_FAILURES.clone()),
        Box::new(ACTIVE_CONTROLLERS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Bring the broker counters up to the broker's own totals.
///
/// The broker counts with plain atomics; this copies the delta so the
/// Prometheus counters stay monotonic.
pub fn sync_broker_counters(events_published: u64, handler_failures: u64) {
    EVENTS_PUBLISHED.inc_by(events_published.saturating_sub(EVENTS_PUBLISHED.get()));
    HANDLER_FAILURES.inc_by(handler_failures.saturating_sub(HANDLER_FAILURES.get()));
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
