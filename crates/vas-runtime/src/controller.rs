//! # Controllers
//!
//! A controller mediates between one view model and event-driven input. It
//! is created by its screen state, handed the state's view model through
//! [`Controller::set_view_model`], started when the state loads and stopped
//! when the state is suspended or discarded.
//!
//! ## Lifecycle
//!
//! ```text
//!   created ──set_view_model──→ ready ──start──→ started ──stop──→ ready
//!                                 ↑                                  │
//!                                 └──────────────────────────────────┘
//! ```
//!
//! Every subscription taken through [`ControllerBase::subscribe`] and every
//! watcher taken through [`ControllerBase::watch_view_model`] is recorded and
//! released by `stop`, so no subscription survives a stop/start cycle.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use vas_bus::{AsyncHandler, Event, EventsBroker, Handler, SubscriptionToken};
use vas_telemetry::ACTIVE_CONTROLLERS;
use vas_types::{ListenerId, PropertyChange, ViewModel};

use crate::errors::ControllerError;

/// State shared by every controller.
pub struct ControllerBase<VM: ViewModel> {
    name: String,
    broker: EventsBroker,
    view_model: Option<Arc<VM>>,
    started: bool,
    subscriptions: Vec<SubscriptionToken>,
    watchers: Vec<ListenerId>,
}

impl<VM: ViewModel> ControllerBase<VM> {
    /// A stopped controller without a view model.
    pub fn new(name: impl Into<String>, broker: EventsBroker) -> Self {
        Self {
            name: name.into(),
            broker,
            view_model: None,
            started: false,
            subscriptions: Vec::new(),
            watchers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn broker(&self) -> &EventsBroker {
        &self.broker
    }

    /// The controlled view model.
    pub fn view_model(&self) -> Result<Arc<VM>, ControllerError> {
        self.view_model
            .clone()
            .ok_or_else(|| ControllerError::MissingViewModel {
                controller: self.name.clone(),
            })
    }

    /// Rebind to `view_model`. Only allowed while stopped.
    pub fn set_view_model(&mut self, view_model: Arc<VM>) -> Result<(), ControllerError> {
        if self.started {
            return Err(ControllerError::Running {
                controller: self.name.clone(),
            });
        }
        self.view_model = Some(view_model);
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Subscribe a synchronous handler for the lifetime of this start.
    pub fn subscribe<E: Event>(
        &mut self,
        handler: Handler<E>,
    ) -> Result<SubscriptionToken, ControllerError> {
        self.ensure_started()?;
        let token = self.broker.subscribe(handler);
        self.subscriptions.push(token);
        Ok(token)
    }

    /// Subscribe an asynchronous handler for the lifetime of this start.
    pub fn subscribe_async<E: Event>(
        &mut self,
        handler: AsyncHandler<E>,
    ) -> Result<SubscriptionToken, ControllerError> {
        self.ensure_started()?;
        let token = self.broker.subscribe_async(handler);
        self.subscriptions.push(token);
        Ok(token)
    }

    /// Observe the view model's change notifications until `stop`.
    pub fn watch_view_model<F>(&mut self, listener: F) -> Result<ListenerId, ControllerError>
    where
        F: Fn(&PropertyChange) + Send + Sync + 'static,
    {
        self.ensure_started()?;
        let id = self.view_model()?.notifier().subscribe(listener);
        self.watchers.push(id);
        Ok(id)
    }

    /// Number of broker subscriptions currently held.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Mark the controller started.
    ///
    /// Called by [`Controller::start`] before `connect_events`; custom
    /// `start` implementations must call it too.
    pub fn enter_started(&mut self) -> Result<(), ControllerError> {
        if self.started {
            return Err(ControllerError::AlreadyStarted {
                controller: self.name.clone(),
            });
        }
        if self.view_model.is_none() {
            return Err(ControllerError::MissingViewModel {
                controller: self.name.clone(),
            });
        }
        self.started = true;
        ACTIVE_CONTROLLERS.inc();
        Ok(())
    }

    /// Revoke every recorded subscription and watcher and mark the
    /// controller stopped.
    pub fn release(&mut self) {
        for token in self.subscriptions.drain(..) {
            if !self.broker.unsubscribe_token(&token) {
                warn!(
                    controller = %self.name,
                    subscription = %token.id(),
                    "Subscription was already gone"
                );
            }
        }

        if let Some(view_model) = &self.view_model {
            for id in self.watchers.drain(..) {
                view_model.notifier().unsubscribe(id);
            }
        }
        self.watchers.clear();

        if self.started {
            self.started = false;
            ACTIVE_CONTROLLERS.dec();
        }
    }

    /// Fail with [`ControllerError::NotStarted`] unless started.
    pub fn ensure_started(&self) -> Result<(), ControllerError> {
        if self.started {
            Ok(())
        } else {
            Err(ControllerError::NotStarted {
                controller: self.name.clone(),
            })
        }
    }
}

impl<VM: ViewModel> Drop for ControllerBase<VM> {
    fn drop(&mut self) {
        if self.started {
            debug!(controller = %self.name, "Controller dropped while started");
            self.release();
        }
    }
}

/// Lifecycle contract for controllers.
///
/// Implementors provide access to their [`ControllerBase`] and usually
/// override `connect_events` to subscribe through the base.
#[async_trait]
pub trait Controller<VM: ViewModel>: Send + Sync {
    fn base(&self) -> &ControllerBase<VM>;

    fn base_mut(&mut self) -> &mut ControllerBase<VM>;

    fn name(&self) -> &str {
        self.base().name()
    }

    /// Register event handlers. Runs after the controller is marked started.
    async fn connect_events(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Extra teardown. Runs before the recorded subscriptions are revoked.
    async fn disconnect_events(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn set_view_model(&mut self, view_model: Arc<VM>) -> Result<(), ControllerError> {
        self.base_mut().set_view_model(view_model)
    }

    async fn start(&mut self) -> Result<(), ControllerError> {
        self.base_mut().enter_started()?;

        if let Err(source) = self.connect_events().await {
            // Nothing half-subscribed may outlive a failed start
            self.base_mut().release();
            return Err(ControllerError::Hook {
                controller: self.name().to_string(),
                source,
            });
        }

        debug!(
            controller = %self.name(),
            subscriptions = self.base().subscription_count(),
            "Controller started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ControllerError> {
        self.base().ensure_started()?;

        let outcome = self.disconnect_events().await;
        self.base_mut().release();
        debug!(controller = %self.name(), "Controller stopped");

        outcome.map_err(|source| ControllerError::Hook {
            controller: self.name().to_string(),
            source,
        })
    }
}
