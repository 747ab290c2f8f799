//! # View-Model Change Notification
//!
//! Every bindable view-model owns a [`ChangeNotifier`]. Property setters call
//! [`ChangeNotifier::notify`] after a value changes, and bindings or
//! controllers register listeners to observe those changes.
//!
//! Listeners are invoked outside the notifier's lock, so a listener may
//! register or remove listeners (including itself) while being notified.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

/// Identifies a listener registered with a [`ChangeNotifier`] or a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Which property of a view-model changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyChange {
    /// A single named property changed.
    Property(&'static str),
    /// Every property must be considered changed (e.g. the model was replaced).
    All,
}

impl PropertyChange {
    /// Whether this notification concerns `property`.
    #[must_use]
    pub fn affects(&self, property: &str) -> bool {
        match self {
            Self::Property(name) => *name == property,
            Self::All => true,
        }
    }

    /// The changed property name, `None` for [`PropertyChange::All`].
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Property(name) => Some(name),
            Self::All => None,
        }
    }
}

/// Callback invoked with every change notification.
pub type ChangeListener = Arc<dyn Fn(&PropertyChange) + Send + Sync>;

/// Dispatches property-change notifications to registered listeners.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, ChangeListener)>>,
}

impl ChangeNotifier {
    /// Create a notifier with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it is called for every subsequent notification.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PropertyChange) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Notify every listener, in registration order.
    pub fn notify(&self, change: PropertyChange) {
        // Snapshot so listeners run without the lock held
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(change = ?change, listeners = listeners.len(), "Property changed");

        for listener in listeners {
            listener(&change);
        }
    }

    /// Shorthand for `notify(PropertyChange::Property(name))`.
    pub fn notify_property(&self, name: &'static str) {
        self.notify(PropertyChange::Property(name));
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A presentation-facing data object that reports property changes.
pub trait ViewModel: Send + Sync + 'static {
    /// The notifier every property setter reports through.
    fn notifier(&self) -> &ChangeNotifier;
}
