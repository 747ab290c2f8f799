//! The widget contract consumed by bindings.
//!
//! A widget is whatever the UI layer exposes for one bindable property: a
//! text box's text, a slider's position, a toggle's state. The runtime never
//! renders anything itself.

use std::sync::Arc;

use vas_types::ListenerId;

/// Callback fired when the widget value changes.
pub type WidgetListener = Arc<dyn Fn() + Send + Sync>;

/// One gettable/settable widget property with change notification.
pub trait Widget<V>: Send + Sync {
    /// Current value.
    fn value(&self) -> V;

    /// Replace the value.
    ///
    /// Toolkits commonly raise their change notification for programmatic
    /// writes as well as user edits; bindings cope with either behaviour.
    fn set_value(&self, value: V);

    /// Register a change listener.
    fn on_changed(&self, listener: WidgetListener) -> ListenerId;

    /// Remove a change listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
