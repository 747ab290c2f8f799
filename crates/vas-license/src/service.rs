//! # License Limitations Service
//!
//! Keeps a [`LicenseLimitations`] registry current and answers whether a
//! limited action may run.
//!
//! The service subscribes to [`LicenseChangeEvent`] while running. Each
//! event carries the complete new set of records; the registry is replaced
//! wholesale, never patched.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vas_bus::{handler, EventsBroker, SubscriptionToken};
use vas_types::{Service, ServiceError, ServiceErrorKind};

use crate::limitation::{LicenseError, LicenseLimitation, LimitationKind};
use crate::registry::LicenseLimitations;

/// Start/stop level of the licensing service.
pub const LICENSE_SERVICE_LEVEL: i32 = 30;

const SERVICE_NAME: &str = "License limitations";

/// Published by the licensing layer when the license is re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseChangeEvent {
    /// Every limitation in force under the new license.
    pub limitations: Vec<LicenseLimitation>,
}

type SharedRegistry = Arc<RwLock<LicenseLimitations<LicenseLimitation>>>;

/// Service wrapping the application's limitation registry.
pub struct LicenseLimitationsService {
    broker: EventsBroker,
    registry: SharedRegistry,
    subscription: Mutex<Option<SubscriptionToken>>,
}

impl LicenseLimitationsService {
    /// Service with an empty registry.
    pub fn new(broker: EventsBroker) -> Self {
        Self {
            broker,
            registry: Arc::new(RwLock::new(LicenseLimitations::new())),
            subscription: Mutex::new(None),
        }
    }

    /// Replace every limitation.
    ///
    /// All records are validated first; on error the registry is unchanged.
    pub fn rebuild(&self, limitations: Vec<LicenseLimitation>) -> Result<(), LicenseError> {
        rebuild_into(&self.registry, limitations)
    }

    /// Whether an action guarded by `name` may run when `count` items
    /// already exist.
    ///
    /// - unregistered name: allowed (logged, since it usually means a typo)
    /// - no enabled record: allowed
    /// - an enabled `Feature` record: denied
    /// - enabled `Count` records: `count` must stay below the smallest maximum
    #[must_use]
    pub fn can_execute(&self, name: &str, count: u32) -> bool {
        let registry = self.registry.read();
        let records = registry.get_limitations(Some(name));
        if records.is_empty() {
            warn!(limitation = name, "Limitation not registered, allowing");
            return true;
        }

        let enabled: Vec<&LicenseLimitation> =
            records.into_iter().filter(|l| l.enabled).collect();
        if enabled.iter().any(|l| l.kind == LimitationKind::Feature) {
            return false;
        }

        enabled
            .iter()
            .map(|l| l.maximum)
            .min()
            .map_or(true, |maximum| count < maximum)
    }

    /// Copies of the limitations named `name`, or all of them.
    #[must_use]
    pub fn limitations(&self, name: Option<&str>) -> Vec<LicenseLimitation> {
        self.registry
            .read()
            .get_limitations(name)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Whether the service is subscribed to license changes.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.subscription.lock().is_some()
    }
}

fn rebuild_into(
    registry: &SharedRegistry,
    limitations: Vec<LicenseLimitation>,
) -> Result<(), LicenseError> {
    for limitation in &limitations {
        limitation.validate()?;
    }
    let rebuilt: LicenseLimitations<LicenseLimitation> = limitations.into_iter().collect();
    let count = rebuilt.len();
    *registry.write() = rebuilt;
    debug!(limitations = count, "License limitations rebuilt");
    Ok(())
}

#[async_trait]
impl Service for LicenseLimitationsService {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn level(&self) -> i32 {
        LICENSE_SERVICE_LEVEL
    }

    async fn start(&self) -> Result<(), ServiceError> {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return Err(ServiceError::new(
                SERVICE_NAME,
                ServiceErrorKind::StartFailed,
                "already running",
            ));
        }

        let registry = Arc::clone(&self.registry);
        let token = self
            .broker
            .subscribe(handler(move |event: &LicenseChangeEvent| {
                rebuild_into(&registry, event.limitations.clone())?;
                Ok(())
            }));
        *subscription = Some(token);

        info!(service = SERVICE_NAME, "Service started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        let Some(token) = self.subscription.lock().take() else {
            return Err(ServiceError::new(
                SERVICE_NAME,
                ServiceErrorKind::NotRunning,
                "not running",
            ));
        };
        self.broker.unsubscribe_token(&token);

        info!(service = SERVICE_NAME, "Service stopped");
        Ok(())
    }
}
