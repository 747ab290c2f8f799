//! # VAS License - Feature Limitations
//!
//! Licensing decides which features are limited; this crate only records the
//! outcome and answers "may this action run?".
//!
//! - [`LicenseLimitations`] is an append-only registry keyed by limitation
//!   name. Several records may share a name (tiered maxima).
//! - [`LicenseLimitationsService`] owns a registry of [`LicenseLimitation`]
//!   records and rebuilds it wholesale whenever a [`LicenseChangeEvent`] is
//!   published on the broker.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod limitation;
pub mod registry;
pub mod service;

pub use limitation::{LicenseError, LicenseLimitation, Limitation, LimitationKind};
pub use registry::LicenseLimitations;
pub use service::{LicenseChangeEvent, LicenseLimitationsService, LICENSE_SERVICE_LEVEL};
