//! # Runtime Events
//!
//! Event kinds published by the runtime itself. Application code defines its
//! own kinds as plain structs; any `Send + Sync + 'static` type is an event.

use serde::{Deserialize, Serialize};

/// Published after every successful navigation.
///
/// `name` is the state that became current. `is_modal` tells whether that
/// state sits on the modal stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    /// Name of the state that is now current (`None` if the stack emptied).
    pub name: Option<String>,
    /// Whether the current state is a modal.
    pub is_modal: bool,
}

impl NavigationEvent {
    /// Navigation to a regular (non-modal) state.
    pub fn to(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_modal: false,
        }
    }

    /// Navigation to a modal state.
    pub fn to_modal(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_modal: true,
        }
    }
}
