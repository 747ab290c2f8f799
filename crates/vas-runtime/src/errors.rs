//! # Runtime Errors
//!
//! Navigation errors are reported to the caller of the navigation API.
//! State and controller errors travel inside them.

use std::fmt;

use thiserror::Error;

/// Build step of a screen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    CreateViewModel,
    CreateControllers,
    LoadState,
    Resume,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateViewModel => write!(f, "create_view_model"),
            Self::CreateControllers => write!(f, "create_controllers"),
            Self::LoadState => write!(f, "load_state"),
            Self::Resume => write!(f, "resume"),
        }
    }
}

/// Controller lifecycle errors.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller `{controller}` is already started")]
    AlreadyStarted { controller: String },

    #[error("controller `{controller}` is not started")]
    NotStarted { controller: String },

    #[error("controller `{controller}` has no view model")]
    MissingViewModel { controller: String },

    #[error("cannot replace the view model of running controller `{controller}`")]
    Running { controller: String },

    #[error("controller `{controller}` failed: {source}")]
    Hook {
        controller: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised while building or resuming a screen state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("{stage} failed: {source}")]
    Hook {
        stage: BuildStage,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("state `{state}` expects {expected} data, got {found}")]
    DataMismatch {
        state: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("view model has not been created")]
    ViewModelMissing,

    #[error("state `{0}` is not loaded")]
    NotLoaded(String),
}

/// Errors returned by the navigation API.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("state `{0}` is already registered")]
    DuplicateRegistration(String),

    #[error("state `{0}` is not registered")]
    UnknownState(String),

    #[error("failed to load state `{state}`: {source}")]
    StateLoadError {
        state: String,
        #[source]
        source: StateError,
    },

    #[error("there is no previous state to go back to")]
    NoHistory,

    #[error("no home state has been set")]
    HomeNotSet,

    #[error("state `{0}` is not in the navigation history")]
    NotInHistory(String),

    #[error("state `{0}` is on the navigation stack")]
    StateInUse(String),

    #[error("another transition is in progress")]
    TransitionInProgress,
}

impl NavigationError {
    /// Wrap a state error for `state`.
    pub(crate) fn load(state: impl Into<String>, source: StateError) -> Self {
        Self::StateLoadError {
            state: state.into(),
            source,
        }
    }
}
