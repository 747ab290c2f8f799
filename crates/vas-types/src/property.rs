//! Observable value cell used to back view-model properties.

use std::fmt;

use parking_lot::RwLock;

use crate::viewmodel::ChangeNotifier;

/// A named value that reports changes through a [`ChangeNotifier`].
///
/// Setting a value equal to the current one is not a change and emits no
/// notification.
pub struct Property<T> {
    name: &'static str,
    value: RwLock<T>,
}

impl<T: Clone + PartialEq> Property<T> {
    /// Create a property holding `value`.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            value: RwLock::new(value),
        }
    }

    /// The property name carried by change notifications.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Update the value without notifying; returns whether anything changed.
    pub fn set_without_notifying(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        true
    }

    /// Update the value and notify `notifier` if it changed.
    pub fn set(&self, value: T, notifier: &ChangeNotifier) -> bool {
        // Lock released before listeners run
        let changed = self.set_without_notifying(value);
        if changed {
            notifier.notify_property(self.name);
        }
        changed
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &*self.value.read())
            .finish()
    }
}
