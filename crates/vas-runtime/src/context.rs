//! # Application Context
//!
//! Explicit replacement for process-wide singletons. Every screen factory
//! receives the context and passes what its controllers need (usually the
//! broker) at construction.

use std::sync::{Arc, OnceLock, Weak};

use vas_bus::EventsBroker;
use vas_license::LicenseLimitationsService;

use crate::config::RuntimeConfig;
use crate::state_controller::StateController;

/// Shared handles to the runtime's long-lived collaborators.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    broker: EventsBroker,
    config: RuntimeConfig,
    licensing: Arc<LicenseLimitationsService>,
    navigator: OnceLock<Weak<StateController>>,
}

impl AppContext {
    pub fn new(
        broker: EventsBroker,
        config: RuntimeConfig,
        licensing: Arc<LicenseLimitationsService>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                broker,
                config,
                licensing,
                navigator: OnceLock::new(),
            }),
        }
    }

    pub fn broker(&self) -> &EventsBroker {
        &self.inner.broker
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn licensing(&self) -> &Arc<LicenseLimitationsService> {
        &self.inner.licensing
    }

    /// The state controller, once one has been created for this context.
    ///
    /// Held weakly: screens built by the navigator must not keep it alive.
    pub fn navigator(&self) -> Option<Arc<StateController>> {
        self.inner.navigator.get().and_then(Weak::upgrade)
    }

    /// Returns `false` if a navigator was already attached.
    pub(crate) fn attach_navigator(&self, navigator: &Arc<StateController>) -> bool {
        self.inner
            .navigator
            .set(Arc::downgrade(navigator))
            .is_ok()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.inner.config)
            .field("broker", &self.inner.broker)
            .field("navigator", &self.navigator().is_some())
            .finish()
    }
}
