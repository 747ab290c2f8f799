//! # State Controller - Navigation State Machine
//!
//! Holds the registry of named screen factories, the navigation stack and
//! the modal stack, and runs every transition between screens.
//!
//! ## Transition
//!
//! ```text
//!  move_to(name, data)
//!     │
//!     ├─ close every modal (top first)
//!     ├─ hide + suspend current        (all its controllers stopped)
//!     ├─ factory → create_view_model → create_controllers → load_state
//!     │
//!     ├─ ok:   push new screen, show its panel, publish NavigationEvent
//!     └─ err:  stop half-built screen, resume + show previous screen,
//!              return StateLoadError
//! ```
//!
//! The previous screen's controllers are always stopped before the next
//! screen's view model is created, so two screens never listen to the
//! broker at the same time.
//!
//! Only one transition runs at a time. A `move_*` call made while another
//! one is running fails with [`NavigationError::TransitionInProgress`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vas_bus::NavigationEvent;
use vas_telemetry::{sync_broker_counters, NAVIGATIONS, NAVIGATION_FAILURES};

use crate::context::AppContext;
use crate::errors::{NavigationError, StateError};
use crate::panel::PanelHost;
use crate::screen_state::{erase_factory, ActiveState, ScreenState, StateFactory};

type BoxedData = Box<dyn Any + Send + Sync>;

/// Typed handle to a registered screen.
///
/// Navigating through a route checks the payload type at compile time.
pub struct Route<D> {
    name: String,
    _data: PhantomData<fn(D)>,
}

impl<D> Route<D> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<D> Clone for Route<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _data: PhantomData,
        }
    }
}

impl<D> fmt::Debug for Route<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("data", &type_name::<D>())
            .finish()
    }
}

struct Registration {
    factory: StateFactory,
    data_type: TypeId,
    data_type_name: &'static str,
}

#[derive(Clone)]
struct Home {
    name: String,
    data: Arc<dyn Fn() -> BoxedData + Send + Sync>,
}

struct Entry {
    state: Box<dyn ActiveState>,
    in_history: bool,
    visible: bool,
}

impl Entry {
    fn name(&self) -> &str {
        self.state.name()
    }
}

#[derive(Default)]
struct Stacks {
    navigation: Vec<Entry>,
    modal: Vec<Entry>,
}

impl Stacks {
    fn current(&self) -> Option<&Entry> {
        self.modal.last().or_else(|| self.navigation.last())
    }

    fn contains(&self, name: &str) -> bool {
        self.navigation
            .iter()
            .chain(self.modal.iter())
            .any(|entry| entry.name() == name)
    }
}

/// Names visible to synchronous readers while a transition runs.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    current: Option<String>,
    history: Vec<String>,
    ids: Vec<Uuid>,
    modals: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Push on top of the navigation stack.
    Push,
    /// Replace the whole navigation stack.
    Home,
}

/// The navigation state machine.
pub struct StateController {
    context: AppContext,
    panel_host: Option<Arc<dyn PanelHost>>,
    registry: RwLock<HashMap<String, Registration>>,
    home: RwLock<Option<Home>>,
    stacks: Mutex<Stacks>,
    snapshot: RwLock<Snapshot>,
}

impl StateController {
    /// Create a navigator and attach it to `context`.
    pub fn new(context: AppContext, panel_host: Option<Arc<dyn PanelHost>>) -> Arc<Self> {
        let navigator = Arc::new(Self {
            context,
            panel_host,
            registry: RwLock::new(HashMap::new()),
            home: RwLock::new(None),
            stacks: Mutex::new(Stacks::default()),
            snapshot: RwLock::new(Snapshot::default()),
        });
        if !navigator.context.attach_navigator(&navigator) {
            warn!("Context already has a navigator; keeping the first one");
        }
        navigator
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a screen factory under `name`.
    pub fn register<S, F>(
        &self,
        name: impl Into<String>,
        factory: F,
    ) -> Result<Route<S::Data>, NavigationError>
    where
        S: ScreenState,
        F: Fn(&AppContext) -> S + Send + Sync + 'static,
    {
        let name = name.into();
        let mut registry = self.registry.write();
        if registry.contains_key(&name) {
            return Err(NavigationError::DuplicateRegistration(name));
        }

        registry.insert(
            name.clone(),
            Registration {
                factory: erase_factory(factory),
                data_type: TypeId::of::<S::Data>(),
                data_type_name: type_name::<S::Data>(),
            },
        );
        debug!(state = %name, data = type_name::<S::Data>(), "State registered");

        Ok(Route {
            name,
            _data: PhantomData,
        })
    }

    /// Remove a screen factory.
    ///
    /// Fails while a screen built from it is on either stack.
    pub fn unregister(&self, name: &str) -> Result<(), NavigationError> {
        let stacks = self.lock_stacks()?;
        if stacks.contains(name) {
            return Err(NavigationError::StateInUse(name.to_string()));
        }
        drop(stacks);

        if self.registry.write().remove(name).is_none() {
            return Err(NavigationError::UnknownState(name.to_string()));
        }

        let mut home = self.home.write();
        if home.as_ref().is_some_and(|home| home.name == name) {
            *home = None;
        }
        debug!(state = %name, "State unregistered");
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.read().contains_key(name)
    }

    /// Record the screen and payload `move_to_home` navigates to.
    pub fn set_home<D>(&self, name: &str, data: D) -> Result<(), NavigationError>
    where
        D: Clone + Send + Sync + 'static,
    {
        self.resolve::<D>(name)?;
        *self.home.write() = Some(Home {
            name: name.to_string(),
            data: Arc::new(move || Box::new(data.clone()) as BoxedData),
        });
        Ok(())
    }

    pub fn home(&self) -> Option<String> {
        self.home.read().as_ref().map(|home| home.name.clone())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate to `name`, keeping the current screen in the back history.
    pub async fn move_to<D>(&self, name: &str, data: D) -> Result<(), NavigationError>
    where
        D: Send + Sync + 'static,
    {
        self.move_to_with_history(name, data, true).await
    }

    /// Navigate to `name`.
    ///
    /// With `add_to_history` false the new screen is discarded, not
    /// suspended, when the next screen is pushed over it.
    pub async fn move_to_with_history<D>(
        &self,
        name: &str,
        data: D,
        add_to_history: bool,
    ) -> Result<(), NavigationError>
    where
        D: Send + Sync + 'static,
    {
        let factory = self.resolve::<D>(name)?;
        let mut stacks = self.lock_stacks()?;
        self.transition(
            &mut stacks,
            name,
            factory,
            Box::new(data),
            add_to_history,
            Transition::Push,
        )
        .await?;
        drop(stacks);

        self.announce(NavigationEvent::to(name)).await;
        Ok(())
    }

    /// Navigate through a typed route.
    pub async fn move_to_route<D>(&self, route: &Route<D>, data: D) -> Result<(), NavigationError>
    where
        D: Send + Sync + 'static,
    {
        self.move_to(route.name(), data).await
    }

    /// Open `name` as a modal over the current screen.
    ///
    /// The screen below keeps running.
    pub async fn move_to_modal<D>(&self, name: &str, data: D) -> Result<(), NavigationError>
    where
        D: Send + Sync + 'static,
    {
        let factory = self.resolve::<D>(name)?;
        let mut stacks = self.lock_stacks()?;

        match self.build(name, factory, Box::new(data)).await {
            Ok(state) => {
                let mut entry = Entry {
                    state,
                    in_history: true,
                    visible: false,
                };
                self.show(&mut entry, true);
                stacks.modal.push(entry);
                NAVIGATIONS.inc();
                info!(state = %name, modals = stacks.modal.len(), "Modal opened");
            }
            Err(source) => {
                NAVIGATION_FAILURES.inc();
                error!(state = %name, error = %source, "Modal failed to load");
                return Err(NavigationError::load(name, source));
            }
        }

        self.refresh_snapshot(&stacks);
        drop(stacks);

        self.announce(NavigationEvent::to_modal(name)).await;
        Ok(())
    }

    /// Close the top modal, or return to the previous screen.
    pub async fn move_back(&self) -> Result<(), NavigationError> {
        let mut stacks = self.lock_stacks()?;

        if let Some(mut modal) = stacks.modal.pop() {
            self.hide(&mut modal, true);
            modal.state.stop().await;
            info!(state = %modal.name(), "Modal closed");
        } else {
            if stacks.navigation.len() < 2 {
                return Err(NavigationError::NoHistory);
            }
            if let Some(mut top) = stacks.navigation.pop() {
                self.hide(&mut top, false);
                top.state.stop().await;
                debug!(state = %top.name(), "State discarded");
            }
            if let Err(e) = self.reactivate(&mut stacks).await {
                self.refresh_snapshot(&stacks);
                return Err(e);
            }
        }

        self.refresh_snapshot(&stacks);
        let event = Self::current_event(&stacks);
        drop(stacks);

        self.announce(event).await;
        Ok(())
    }

    /// Unwind the stack until the most recent screen named `name` is current.
    ///
    /// Going back to the home screen is a [`move_to_home`](Self::move_to_home),
    /// which rebuilds it.
    pub async fn move_back_to(&self, name: &str) -> Result<(), NavigationError> {
        let mut stacks = self.lock_stacks()?;

        let position = stacks
            .navigation
            .iter()
            .rposition(|entry| entry.name() == name)
            .ok_or_else(|| NavigationError::NotInHistory(name.to_string()))?;

        if self.home().as_deref() == Some(name) {
            drop(stacks);
            return self.move_to_home().await;
        }

        self.close_modals(&mut stacks).await;

        if position + 1 < stacks.navigation.len() {
            while stacks.navigation.len() > position + 1 {
                if let Some(mut top) = stacks.navigation.pop() {
                    self.hide(&mut top, false);
                    top.state.stop().await;
                    debug!(state = %top.name(), "State discarded");
                }
            }
            if let Err(e) = self.reactivate(&mut stacks).await {
                self.refresh_snapshot(&stacks);
                return Err(e);
            }
        }

        self.refresh_snapshot(&stacks);
        drop(stacks);

        self.announce(NavigationEvent::to(name)).await;
        Ok(())
    }

    /// Navigate to the home screen and discard everything else.
    pub async fn move_to_home(&self) -> Result<(), NavigationError> {
        let home = self
            .home
            .read()
            .clone()
            .ok_or(NavigationError::HomeNotSet)?;
        let factory = self.resolve_any(&home.name)?;
        let mut stacks = self.lock_stacks()?;

        self.transition(
            &mut stacks,
            &home.name,
            factory,
            (home.data)(),
            true,
            Transition::Home,
        )
        .await?;
        drop(stacks);

        self.announce(NavigationEvent::to(home.name.as_str())).await;
        Ok(())
    }

    /// Stop every screen, modals first, then the navigation stack top first.
    pub async fn shutdown(&self) {
        let mut stacks = self.stacks.lock().await;
        self.close_modals(&mut stacks).await;
        while let Some(mut entry) = stacks.navigation.pop() {
            self.hide(&mut entry, false);
            entry.state.stop().await;
        }
        self.refresh_snapshot(&stacks);
        info!("Navigation stack cleared");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Name of the visible screen (top modal first).
    pub fn current(&self) -> Option<String> {
        self.snapshot.read().current.clone()
    }

    /// Navigation stack names, bottom to top.
    pub fn history(&self) -> Vec<String> {
        self.snapshot.read().history.clone()
    }

    /// Open modal names, bottom to top.
    pub fn modals(&self) -> Vec<String> {
        self.snapshot.read().modals.clone()
    }

    /// Instance ids on the navigation stack, bottom to top.
    pub fn stack_ids(&self) -> Vec<Uuid> {
        self.snapshot.read().ids.clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_stacks(&self) -> Result<MutexGuard<'_, Stacks>, NavigationError> {
        self.stacks
            .try_lock()
            .map_err(|_| NavigationError::TransitionInProgress)
    }

    fn resolve<D: 'static>(&self, name: &str) -> Result<StateFactory, NavigationError> {
        let registry = self.registry.read();
        let registration = registry
            .get(name)
            .ok_or_else(|| NavigationError::UnknownState(name.to_string()))?;

        if registration.data_type != TypeId::of::<D>() {
            return Err(NavigationError::load(
                name,
                StateError::DataMismatch {
                    state: name.to_string(),
                    expected: registration.data_type_name,
                    found: type_name::<D>(),
                },
            ));
        }
        Ok(Arc::clone(&registration.factory))
    }

    fn resolve_any(&self, name: &str) -> Result<StateFactory, NavigationError> {
        self.registry
            .read()
            .get(name)
            .map(|registration| Arc::clone(&registration.factory))
            .ok_or_else(|| NavigationError::UnknownState(name.to_string()))
    }

    async fn transition(
        &self,
        stacks: &mut Stacks,
        name: &str,
        factory: StateFactory,
        data: BoxedData,
        in_history: bool,
        kind: Transition,
    ) -> Result<(), NavigationError> {
        self.close_modals(stacks).await;

        if let Some(current) = stacks.navigation.last_mut() {
            self.hide(current, false);
            current.state.suspend().await;
        }

        let state = match self.build(name, factory, data).await {
            Ok(state) => state,
            Err(source) => {
                NAVIGATION_FAILURES.inc();
                error!(state = %name, error = %source, "State failed to load; keeping previous state");
                if let Err(e) = self.reactivate(stacks).await {
                    error!(error = %e, "Previous state could not be resumed");
                }
                self.refresh_snapshot(stacks);
                return Err(NavigationError::load(name, source));
            }
        };

        match kind {
            Transition::Push => {
                if stacks.navigation.last().is_some_and(|entry| !entry.in_history) {
                    if let Some(mut outgoing) = stacks.navigation.pop() {
                        outgoing.state.stop().await;
                        debug!(state = %outgoing.name(), "State left out of history");
                    }
                }
            }
            Transition::Home => {
                while let Some(mut entry) = stacks.navigation.pop() {
                    entry.state.stop().await;
                }
            }
        }

        let mut entry = Entry {
            state,
            in_history,
            visible: false,
        };
        self.show(&mut entry, false);
        let id = entry.state.id();
        stacks.navigation.push(entry);
        self.enforce_history_limit(stacks).await;
        self.refresh_snapshot(stacks);

        NAVIGATIONS.inc();
        info!(state = %name, id = %id, depth = stacks.navigation.len(), "Navigated");
        Ok(())
    }

    /// Instantiate and build a screen, stopping it if any step fails.
    async fn build(
        &self,
        name: &str,
        factory: StateFactory,
        data: BoxedData,
    ) -> Result<Box<dyn ActiveState>, StateError> {
        let mut state = factory(&self.context, name, data)?;

        if let Err(e) = build_steps(state.as_mut()).await {
            state.stop().await;
            return Err(e);
        }
        Ok(state)
    }

    /// Resume and show the top of the navigation stack.
    async fn reactivate(&self, stacks: &mut Stacks) -> Result<(), NavigationError> {
        let Some(entry) = stacks.navigation.last_mut() else {
            return Ok(());
        };

        let resumed = entry.state.resume().await;
        self.show(entry, false);
        resumed.map_err(|source| {
            NAVIGATION_FAILURES.inc();
            error!(state = %entry.name(), error = %source, "State failed to resume");
            NavigationError::load(entry.name(), source)
        })
    }

    async fn close_modals(&self, stacks: &mut Stacks) {
        while let Some(mut modal) = stacks.modal.pop() {
            self.hide(&mut modal, true);
            modal.state.stop().await;
            debug!(state = %modal.name(), "Modal closed");
        }
    }

    async fn enforce_history_limit(&self, stacks: &mut Stacks) {
        let limit = self.context.config().max_history + 1;
        while stacks.navigation.len() > limit {
            let mut oldest = stacks.navigation.remove(0);
            oldest.state.stop().await;
            debug!(state = %oldest.name(), "Oldest state dropped from history");
        }
    }

    fn show(&self, entry: &mut Entry, is_modal: bool) {
        if entry.visible {
            return;
        }
        if let Some(panel) = entry.state.panel() {
            panel.on_load();
            if let Some(host) = &self.panel_host {
                host.present(panel, is_modal);
            }
        }
        entry.visible = true;
    }

    fn hide(&self, entry: &mut Entry, is_modal: bool) {
        if !entry.visible {
            return;
        }
        if let Some(panel) = entry.state.panel() {
            panel.on_unload();
            if let Some(host) = &self.panel_host {
                host.dismiss(panel, is_modal);
            }
        }
        entry.visible = false;
    }

    fn refresh_snapshot(&self, stacks: &Stacks) {
        let names = |entries: &[Entry]| entries.iter().map(|e| e.name().to_string()).collect();
        *self.snapshot.write() = Snapshot {
            current: stacks.current().map(|entry| entry.name().to_string()),
            history: names(&stacks.navigation),
            ids: stacks.navigation.iter().map(|e| e.state.id()).collect(),
            modals: names(&stacks.modal),
        };
    }

    fn current_event(stacks: &Stacks) -> NavigationEvent {
        match (stacks.modal.last(), stacks.navigation.last()) {
            (Some(modal), _) => NavigationEvent::to_modal(modal.name()),
            (None, Some(entry)) => NavigationEvent::to(entry.name()),
            (None, None) => NavigationEvent {
                name: None,
                is_modal: false,
            },
        }
    }

    /// Publish after the stack lock is released so handlers may navigate.
    async fn announce(&self, event: NavigationEvent) {
        let broker = self.context.broker();
        if let Err(e) = broker.publish_all(event).await {
            warn!(error = %e, "Navigation event handlers failed");
        }
        sync_broker_counters(broker.events_published(), broker.handler_failures());
    }

}

async fn build_steps(state: &mut dyn ActiveState) -> Result<(), StateError> {
    state.create_view_model()?;
    state.create_controllers()?;
    state.load_state().await
}

impl fmt::Debug for StateController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot.read();
        f.debug_struct("StateController")
            .field("registered", &self.registry.read().len())
            .field("current", &snapshot.current)
            .field("history", &snapshot.history)
            .field("modals", &snapshot.modals)
            .finish()
    }
}
