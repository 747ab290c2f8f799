//! # VAS Types Crate
//!
//! Types shared by every layer of the runtime.
//!
//! ## Contents
//!
//! - **View-models**: [`ViewModel`], [`ChangeNotifier`] and [`PropertyChange`]
//!   carry property-change notifications from a view-model to whoever
//!   observes it (bindings, controllers).
//! - **Properties**: [`Property`] is an observable value cell that only
//!   notifies when its value actually changes.
//! - **Services**: [`Service`] is the lifecycle contract for long-lived
//!   application services started and stopped by level.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod property;
pub mod service;
pub mod viewmodel;

pub use property::Property;
pub use service::{Service, ServiceError, ServiceErrorKind, ServiceStatus};
pub use viewmodel::{ChangeListener, ChangeNotifier, ListenerId, PropertyChange, ViewModel};
