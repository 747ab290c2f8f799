//! # Service Trait - Application Service Lifecycle
//!
//! Defines the contract for long-lived application services (licensing,
//! update checks, event managers) that live for the whole session.
//!
//! ## Ordering
//!
//! Every service reports a `level`. The runtime starts services in ascending
//! level order and stops them in descending level order, so a service may
//! rely on lower-level services while it runs.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use vas_types::{Service, ServiceError};
//! use async_trait::async_trait;
//!
//! pub struct UpdatesNotifier { /* ... */ }
//!
//! #[async_trait]
//! impl Service for UpdatesNotifier {
//!     fn name(&self) -> &str { "Updates notifier" }
//!     fn level(&self) -> i32 { 90 }
//!     async fn start(&self) -> Result<(), ServiceError> { Ok(()) }
//!     async fn stop(&self) -> Result<(), ServiceError> { Ok(()) }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for service operations.
#[derive(Debug, Clone, Error)]
#[error("[{service}] {kind}: {message}")]
pub struct ServiceError {
    /// The service that encountered the error.
    pub service: String,
    /// Error kind.
    pub kind: ServiceErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl ServiceError {
    /// Create a new service error.
    pub fn new(
        service: impl Into<String>,
        kind: ServiceErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Categories of service errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceErrorKind {
    /// The service failed to start.
    StartFailed,
    /// The service failed to stop gracefully.
    StopFailed,
    /// The operation requires a running service.
    NotRunning,
    /// Configuration error.
    ConfigurationError,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed => write!(f, "StartFailed"),
            Self::StopFailed => write!(f, "StopFailed"),
            Self::NotRunning => write!(f, "NotRunning"),
            Self::ConfigurationError => write!(f, "ConfigurationError"),
        }
    }
}

/// Lifecycle status of a registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    /// Registered but never started.
    Registered,
    /// Start in progress.
    Starting,
    /// Running normally.
    Running,
    /// Stopped gracefully.
    Stopped,
    /// Start or stop failed.
    Failed,
}

/// The trait every application service implements.
#[async_trait]
pub trait Service: Send + Sync {
    /// Human-readable name, used in logs and errors.
    fn name(&self) -> &str;

    /// Start/stop ordering level; lower levels start first and stop last.
    fn level(&self) -> i32;

    /// Start the service.
    ///
    /// Typical work: subscribe to broker events, load initial state.
    async fn start(&self) -> Result<(), ServiceError>;

    /// Stop the service, releasing every subscription taken in `start`.
    async fn stop(&self) -> Result<(), ServiceError>;
}
