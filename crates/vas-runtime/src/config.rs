//! # Runtime Configuration
//!
//! Defaults suit a desktop session; every field can be overridden from the
//! environment.

use std::env;

use thiserror::Error;

/// Default home state name.
pub const DEFAULT_HOME_STATE: &str = "home";

/// Default number of suspended screens kept for `move_back`.
pub const DEFAULT_MAX_HISTORY: usize = 32;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A setting has an unusable value.
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// State the runtime navigates to on start.
    pub home_state: String,
    /// Suspended screens kept below the current one (at least 1).
    pub max_history: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            home_state: DEFAULT_HOME_STATE.to_string(),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl RuntimeConfig {
    /// Load from environment variables.
    ///
    /// - `VAS_HOME_STATE`: home state name (default: home)
    /// - `VAS_MAX_HISTORY`: suspended screens kept (default: 32, minimum 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(home) = lookup("VAS_HOME_STATE") {
            config.home_state = home;
        }

        if let Some(raw) = lookup("VAS_MAX_HISTORY") {
            config.max_history =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: "VAS_MAX_HISTORY",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.home_state.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "VAS_HOME_STATE",
                value: self.home_state.clone(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                key: "VAS_MAX_HISTORY",
                value: self.max_history.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
