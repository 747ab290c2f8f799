//! # Screen States
//!
//! A screen state assembles the view model and controllers of one
//! navigable screen and owns them while the screen is on the stack.
//!
//! ## Build Sequence
//!
//! ```text
//! factory(&AppContext) → create_view_model(data)
//!                      → create_controllers(data)   (set_view_model on each)
//!                      → load_state(data)           (start each, then load_data)
//! ```
//!
//! A failed step leaves the state half-built; the navigator stops it before
//! discarding it.

use std::any::{type_name, Any};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;
use vas_types::ViewModel;

use crate::context::AppContext;
use crate::controller::Controller;
use crate::errors::{BuildStage, StateError};
use crate::panel::Panel;

/// Controllers owned by a screen, in start order.
pub type Controllers<VM> = Vec<Box<dyn Controller<VM>>>;

/// One navigable screen.
///
/// `Data` is the typed payload handed to the screen when navigating to it;
/// use `()` for screens that take none.
#[async_trait]
pub trait ScreenState: Send + Sync + 'static {
    type ViewModel: ViewModel;
    type Data: Send + Sync + 'static;

    /// Construct the view model. Called exactly once per instance.
    fn create_view_model(&mut self, data: &Self::Data) -> anyhow::Result<Arc<Self::ViewModel>>;

    /// Construct the controllers. The runtime binds each one to the view
    /// model created above.
    fn create_controllers(&mut self, data: &Self::Data) -> anyhow::Result<Controllers<Self::ViewModel>>;

    /// Load whatever the view model needs once the controllers run.
    async fn load_data(
        &mut self,
        _view_model: &Arc<Self::ViewModel>,
        _data: &Self::Data,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn panel(&self) -> Option<Arc<dyn Panel>> {
        None
    }
}

/// Type-erased screen instance held on the navigation stacks.
#[async_trait]
pub(crate) trait ActiveState: Send + Sync {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    fn panel(&self) -> Option<Arc<dyn Panel>>;

    fn create_view_model(&mut self) -> Result<(), StateError>;

    fn create_controllers(&mut self) -> Result<(), StateError>;

    async fn load_state(&mut self) -> Result<(), StateError>;

    /// Stop the controllers but keep the view model for a later `resume`.
    async fn suspend(&mut self);

    /// Restart the controllers of a loaded state.
    async fn resume(&mut self) -> Result<(), StateError>;

    /// Stop the controllers in reverse start order and release the view model.
    async fn stop(&mut self);
}

/// Builds an erased instance from boxed navigation data.
pub(crate) type StateFactory = Arc<
    dyn Fn(&AppContext, &str, Box<dyn Any + Send + Sync>) -> Result<Box<dyn ActiveState>, StateError>
        + Send
        + Sync,
>;

/// Erase a typed factory.
pub(crate) fn erase_factory<S, F>(factory: F) -> StateFactory
where
    S: ScreenState,
    F: Fn(&AppContext) -> S + Send + Sync + 'static,
{
    Arc::new(move |context, name, data| {
        let data = data
            .downcast::<S::Data>()
            .map_err(|_| StateError::DataMismatch {
                state: name.to_string(),
                expected: type_name::<S::Data>(),
                found: "another type",
            })?;
        let state = factory(context);
        Ok(Box::new(StateInstance::new(name, state, *data)) as Box<dyn ActiveState>)
    })
}

struct StateInstance<S: ScreenState> {
    state: S,
    name: String,
    id: Uuid,
    data: S::Data,
    view_model: Option<Arc<S::ViewModel>>,
    controllers: Controllers<S::ViewModel>,
    loaded: bool,
}

impl<S: ScreenState> StateInstance<S> {
    fn new(name: &str, state: S, data: S::Data) -> Self {
        Self {
            state,
            name: name.to_string(),
            id: Uuid::new_v4(),
            data,
            view_model: None,
            controllers: Vec::new(),
            loaded: false,
        }
    }

    async fn stop_controllers(&mut self) {
        for controller in self.controllers.iter_mut().rev() {
            if !controller.base().is_started() {
                continue;
            }
            if let Err(e) = controller.stop().await {
                warn!(
                    state = %self.name,
                    controller = %controller.name(),
                    error = %e,
                    "Controller failed to stop cleanly"
                );
            }
        }
    }

    async fn start_controllers(&mut self) -> Result<(), StateError> {
        for controller in self.controllers.iter_mut() {
            controller.start().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: ScreenState> ActiveState for StateInstance<S> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn panel(&self) -> Option<Arc<dyn Panel>> {
        self.state.panel()
    }

    fn create_view_model(&mut self) -> Result<(), StateError> {
        let view_model =
            self.state
                .create_view_model(&self.data)
                .map_err(|source| StateError::Hook {
                    stage: BuildStage::CreateViewModel,
                    source,
                })?;
        self.view_model = Some(view_model);
        Ok(())
    }

    fn create_controllers(&mut self) -> Result<(), StateError> {
        let view_model = self.view_model.clone().ok_or(StateError::ViewModelMissing)?;
        let mut controllers =
            self.state
                .create_controllers(&self.data)
                .map_err(|source| StateError::Hook {
                    stage: BuildStage::CreateControllers,
                    source,
                })?;
        for controller in controllers.iter_mut() {
            controller.set_view_model(Arc::clone(&view_model))?;
        }
        debug!(state = %self.name, controllers = controllers.len(), "Controllers created");
        self.controllers = controllers;
        Ok(())
    }

    async fn load_state(&mut self) -> Result<(), StateError> {
        let view_model = self.view_model.clone().ok_or(StateError::ViewModelMissing)?;
        self.start_controllers().await?;
        self.state
            .load_data(&view_model, &self.data)
            .await
            .map_err(|source| StateError::Hook {
                stage: BuildStage::LoadState,
                source,
            })?;
        self.loaded = true;
        Ok(())
    }

    async fn suspend(&mut self) {
        self.stop_controllers().await;
        debug!(state = %self.name, "State suspended");
    }

    async fn resume(&mut self) -> Result<(), StateError> {
        if !self.loaded {
            return Err(StateError::NotLoaded(self.name.clone()));
        }
        if let Err(e) = self.start_controllers().await {
            self.stop_controllers().await;
            return Err(match e {
                StateError::Controller(source) => StateError::Hook {
                    stage: BuildStage::Resume,
                    source: source.into(),
                },
                other => other,
            });
        }
        debug!(state = %self.name, "State resumed");
        Ok(())
    }

    async fn stop(&mut self) {
        self.stop_controllers().await;
        self.controllers.clear();
        self.view_model = None;
        self.loaded = false;
        debug!(state = %self.name, id = %self.id, "State stopped");
    }
}
