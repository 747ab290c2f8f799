//! Limitation records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Anything that can be stored in a [`crate::LicenseLimitations`] registry.
pub trait Limitation {
    /// The registry key. Not unique.
    fn name(&self) -> &str;
}

/// Errors raised while loading limitation records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    /// A record failed validation.
    #[error("invalid limitation `{name}`: {reason}")]
    InvalidLimitation { name: String, reason: String },
}

/// How a limitation restricts its feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitationKind {
    /// Up to `maximum` items (projects, dashboards...).
    Count,
    /// The feature is unavailable while enabled.
    Feature,
}

/// A named license constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseLimitation {
    pub name: String,
    pub enabled: bool,
    pub maximum: u32,
    pub kind: LimitationKind,
}

impl LicenseLimitation {
    /// An enabled count limitation.
    pub fn count(name: impl Into<String>, maximum: u32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            maximum,
            kind: LimitationKind::Count,
        }
    }

    /// An enabled feature limitation.
    pub fn feature(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            maximum: 0,
            kind: LimitationKind::Feature,
        }
    }

    /// Same record with `enabled` replaced.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Reject records that cannot be looked up.
    pub fn validate(&self) -> Result<(), LicenseError> {
        if self.name.trim().is_empty() {
            return Err(LicenseError::InvalidLimitation {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Limitation for LicenseLimitation {
    fn name(&self) -> &str {
        &self.name
    }
}
