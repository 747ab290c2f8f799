//! # Service Registry
//!
//! Owns the application's long-lived services and runs their lifecycle.
//!
//! ## Ordering
//!
//! ```text
//! start_all:  level 10 → level 30 → level 90     (ascending, stable)
//! stop_all:   level 90 → level 30 → level 10     (descending, running only)
//! ```
//!
//! A service that fails to start is marked [`ServiceStatus::Failed`]; the
//! remaining services still start.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};
use vas_types::{Service, ServiceError, ServiceErrorKind, ServiceStatus};

/// The set of registered services.
#[derive(Default)]
pub struct ServiceRegistry {
    /// Registration order; sorting by level is stable over it.
    services: RwLock<Vec<Arc<dyn Service>>>,
    status: RwLock<HashMap<String, ServiceStatus>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Names must be unique.
    pub fn register(&self, service: Arc<dyn Service>) -> Result<(), ServiceError> {
        let name = service.name().to_string();
        let mut status = self.status.write();
        if status.contains_key(&name) {
            return Err(ServiceError::new(
                name,
                ServiceErrorKind::ConfigurationError,
                "a service with this name is already registered",
            ));
        }

        info!(service = %name, level = service.level(), "Registering service");
        status.insert(name, ServiceStatus::Registered);
        self.services.write().push(service);
        Ok(())
    }

    /// Start every service that is not running, lowest level first.
    pub async fn start_all(&self) -> Result<(), Vec<ServiceError>> {
        let mut errors = Vec::new();

        for service in self.ordered(false) {
            let name = service.name().to_string();
            if self.status(&name) == Some(ServiceStatus::Running) {
                continue;
            }

            info!(service = %name, level = service.level(), "Starting service");
            self.set_status(&name, ServiceStatus::Starting);

            match service.start().await {
                Ok(()) => self.set_status(&name, ServiceStatus::Running),
                Err(e) => {
                    warn!(service = %name, error = %e, "Service failed to start");
                    self.set_status(&name, ServiceStatus::Failed);
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Stop every running service, highest level first.
    pub async fn stop_all(&self) -> Result<(), Vec<ServiceError>> {
        let mut errors = Vec::new();

        for service in self.ordered(true) {
            let name = service.name().to_string();
            if self.status(&name) != Some(ServiceStatus::Running) {
                continue;
            }

            info!(service = %name, "Stopping service");
            match service.stop().await {
                Ok(()) => self.set_status(&name, ServiceStatus::Stopped),
                Err(e) => {
                    warn!(service = %name, error = %e, "Service failed to stop");
                    self.set_status(&name, ServiceStatus::Failed);
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn status(&self, name: &str) -> Option<ServiceStatus> {
        self.status.read().get(name).copied()
    }

    pub fn statuses(&self) -> HashMap<String, ServiceStatus> {
        self.status.read().clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services
            .read()
            .iter()
            .find(|service| service.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    fn ordered(&self, descending: bool) -> Vec<Arc<dyn Service>> {
        let mut services = self.services.read().clone();
        services.sort_by_key(|service| service.level());
        if descending {
            services.reverse();
        }
        services
    }

    fn set_status(&self, name: &str, status: ServiceStatus) {
        self.status.write().insert(name.to_string(), status);
    }
}
