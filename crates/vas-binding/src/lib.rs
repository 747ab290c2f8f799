//! # VAS Binding - View-Model to Widget Synchronisation
//!
//! A [`PropertyBinding`] keeps one view-model property and one widget
//! property in step:
//!
//! ```text
//!   ViewModel ──notify──▶ convert() ──────▶ Widget::set_value
//!   ViewModel ◀──setter── convert_back() ◀─ Widget::on_changed
//! ```
//!
//! Properties are addressed through a [`PropertyAccessor`], a typed
//! getter/setter pair, so there is no runtime reflection. When the
//! view-model and widget types differ a [`Converter`] is mandatory; a
//! missing converter is reported by [`PropertyBinding::bind`] rather than at
//! the first write.
//!
//! Writes never echo: a widget write caused by a view-model notification is
//! not fed back to the view-model, and vice versa.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod accessor;
pub mod binding;
pub mod converter;
pub mod headless;
pub mod widget;

pub use accessor::PropertyAccessor;
pub use binding::{Binding, BindingError, BindingSet, PropertyBinding};
pub use converter::{converter, ConversionError, Converter, FnConverter};
pub use headless::HeadlessWidget;
pub use widget::{Widget, WidgetListener};
