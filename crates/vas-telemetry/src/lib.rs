//! # VAS Telemetry
//!
//! Logging and metrics for the runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vas_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VAS_LOG_LEVEL` | `RUST_LOG`, then `info` | Log filter directives |
//! | `VAS_JSON_LOGS` | `false` | Emit JSON lines instead of text |
//! | `VAS_SERVICE_NAME` | `vas` | Service name attached to the startup log |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, sync_broker_counters, ACTIVE_CONTROLLERS, EVENTS_PUBLISHED,
    HANDLER_FAILURES, NAVIGATIONS, NAVIGATION_FAILURES,
};

use thiserror::Error;

/// Telemetry initialisation errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialised,

    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("failed to initialise Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
