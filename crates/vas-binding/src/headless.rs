//! In-memory widget for headless runs and tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use vas_types::ListenerId;

use crate::widget::{Widget, WidgetListener};

/// A widget that just stores its value.
///
/// Like most toolkits it fires its change listeners on every write,
/// programmatic or not. [`HeadlessWidget::edit`] simulates user input.
pub struct HeadlessWidget<V> {
    value: RwLock<V>,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, WidgetListener)>>,
    writes: AtomicUsize,
}

impl<V: Clone + Send + Sync> HeadlessWidget<V> {
    /// Create a widget holding `value`.
    pub fn new(value: V) -> Self {
        Self {
            value: RwLock::new(value),
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Simulate the user changing the value.
    pub fn edit(&self, value: V) {
        self.store(value);
    }

    /// Number of programmatic writes through [`Widget::set_value`].
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn store(&self, value: V) {
        *self.value.write() = value;

        let listeners: Vec<WidgetListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl<V: Clone + Send + Sync> Widget<V> for HeadlessWidget<V> {
    fn value(&self) -> V {
        self.value.read().clone()
    }

    fn set_value(&self, value: V) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.store(value);
    }

    fn on_changed(&self, listener: WidgetListener) -> ListenerId {
        let id = ListenerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

impl<V: fmt::Debug> fmt::Debug for HeadlessWidget<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessWidget")
            .field("value", &*self.value.read())
            .field("writes", &self.writes.load(Ordering::SeqCst))
            .finish()
    }
}
