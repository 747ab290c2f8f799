//! # VAS Runtime
//!
//! The MVVMC runtime: screen navigation, controller lifecycle and the
//! application services around them.
//!
//! ## Modules
//!
//! - `controller` - [`ControllerBase`] and the [`Controller`] lifecycle trait
//! - `screen_state` - [`ScreenState`], the per-screen builder
//! - `state_controller` - [`StateController`], the navigation state machine
//! - `context` - [`AppContext`], explicit access to shared collaborators
//! - `services` - [`ServiceRegistry`], level-ordered service lifecycle
//! - `runtime` - [`AppRuntime`], wiring plus start/shutdown
//!
//! ## Data Flow
//!
//! ```text
//!  view layer ──publish──→ EventsBroker ──→ Controller ──→ ViewModel
//!                                                             │
//!                          widget ←── PropertyBinding ←───────┘
//!
//!  StateController.move_to(name, data)
//!     └─→ factory(&AppContext) → ScreenState → view model + controllers
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod context;
pub mod controller;
pub mod errors;
pub mod panel;
pub mod runtime;
pub mod screen_state;
pub mod services;
pub mod state_controller;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, RuntimeConfig};
pub use context::AppContext;
pub use controller::{Controller, ControllerBase};
pub use errors::{BuildStage, ControllerError, NavigationError, StateError};
pub use panel::{Panel, PanelHost};
pub use runtime::AppRuntime;
pub use screen_state::{Controllers, ScreenState};
pub use services::ServiceRegistry;
pub use state_controller::{Route, StateController};
