//! Contracts implemented by the presentation layer.

use std::sync::Arc;

/// The visual part of a screen.
///
/// The runtime calls `on_load` when the panel becomes the visible screen
/// and `on_unload` when it is hidden or discarded.
pub trait Panel: Send + Sync {
    fn title(&self) -> String;

    fn on_load(&self) {}

    fn on_unload(&self) {}
}

/// The window that shows panels.
pub trait PanelHost: Send + Sync {
    /// Show `panel` as the active screen (or as a modal over it).
    fn present(&self, panel: Arc<dyn Panel>, is_modal: bool);

    /// Remove `panel` from the window.
    fn dismiss(&self, panel: Arc<dyn Panel>, is_modal: bool);
}
