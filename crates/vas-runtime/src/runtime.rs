//! # Application Runtime
//!
//! Wires the broker, the licensing service, the service registry and the
//! navigator into one object with a start/shutdown lifecycle.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Create the events broker and the application context
//! 3. Register built-in services (licensing, level 30)
//! 4. `start()`: start services by level, then navigate home
//!
//! ## Shutdown Sequence
//!
//! 1. Stop every screen (modals first)
//! 2. Stop services in reverse level order

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use vas_bus::EventsBroker;
use vas_license::LicenseLimitationsService;
use vas_types::{Service, ServiceError};

use crate::config::{ConfigError, RuntimeConfig};
use crate::context::AppContext;
use crate::panel::PanelHost;
use crate::services::ServiceRegistry;
use crate::state_controller::StateController;

/// The running application.
pub struct AppRuntime {
    context: AppContext,
    navigator: Arc<StateController>,
    services: ServiceRegistry,
}

impl AppRuntime {
    /// Runtime without a panel host (headless).
    pub fn new(config: RuntimeConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Runtime that presents panels through `host`.
    pub fn with_panel_host(
        config: RuntimeConfig,
        host: Arc<dyn PanelHost>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Some(host))
    }

    fn build(config: RuntimeConfig, host: Option<Arc<dyn PanelHost>>) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(home = %config.home_state, max_history = config.max_history, "Creating runtime");

        let broker = EventsBroker::new();
        let licensing = Arc::new(LicenseLimitationsService::new(broker.clone()));
        let context = AppContext::new(broker, config, Arc::clone(&licensing));
        let navigator = StateController::new(context.clone(), host);

        let services = ServiceRegistry::new();
        // Fresh registry: the only possible failure is a duplicate name
        if let Err(e) = services.register(licensing) {
            warn!(error = %e, "Licensing service not registered");
        }

        Ok(Self {
            context,
            navigator,
            services,
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn navigator(&self) -> &Arc<StateController> {
        &self.navigator
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn licensing(&self) -> &Arc<LicenseLimitationsService> {
        self.context.licensing()
    }

    pub fn register_service(&self, service: Arc<dyn Service>) -> Result<(), ServiceError> {
        self.services.register(service)
    }

    /// Start services, then show the home screen.
    ///
    /// Service start failures are logged; the session still starts. If no
    /// home was set explicitly and the configured home state is registered
    /// with `()` data, it becomes the home.
    pub async fn start(&self) -> Result<()> {
        if let Err(errors) = self.services.start_all().await {
            for e in &errors {
                warn!(error = %e, "Service unavailable for this session");
            }
        }

        let configured = &self.context.config().home_state;
        if self.navigator.home().is_none() && self.navigator.is_registered(configured) {
            self.navigator
                .set_home(configured, ())
                .with_context(|| format!("home state `{configured}` must take no data"))?;
        }

        if self.navigator.home().is_some() {
            self.navigator
                .move_to_home()
                .await
                .context("failed to show the home screen")?;
        } else {
            info!(home = %configured, "No home state registered; starting without a screen");
        }

        info!(services = self.services.len(), "Runtime started");
        Ok(())
    }

    /// Stop every screen, then every service.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        self.navigator.shutdown().await;

        if let Err(errors) = self.services.stop_all().await {
            for e in &errors {
                warn!(error = %e, "Service failed to stop");
            }
            anyhow::bail!("{} service(s) failed to stop", errors.len());
        }

        info!("Shutdown complete");
        Ok(())
    }
}
