//! # Property Binding
//!
//! Links one view-model property to one widget property. See the crate docs
//! for the data flow.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use vas_types::{ListenerId, PropertyChange, ViewModel};

use crate::accessor::PropertyAccessor;
use crate::converter::{ConversionError, Converter};
use crate::widget::Widget;

/// Errors reported when binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The view-model and widget types differ and no converter was given.
    #[error("cannot bind `{property}`: {model} and {widget} differ and no converter is set")]
    IncompatibleBindingTypes {
        property: &'static str,
        model: &'static str,
        widget: &'static str,
    },
}

/// Object-safe view of a binding, used by [`BindingSet`].
pub trait Binding: Send + Sync {
    /// Push the current value to the widget and start listening on both sides.
    fn bind(&self) -> Result<(), BindingError>;

    /// Stop listening on both sides. Idempotent.
    fn unbind(&self);

    /// Whether listeners are attached.
    fn is_bound(&self) -> bool;

    /// The bound view-model property.
    fn property(&self) -> &'static str;
}

enum Conversion<P, V> {
    Identity(PhantomData<fn(P) -> V>),
    Custom(Arc<dyn Converter<P, V>>),
}

impl<P: 'static, V: 'static> Conversion<P, V> {
    fn convert(&self, value: P) -> Result<V, ConversionError> {
        match self {
            Self::Identity(_) => cast(value),
            Self::Custom(converter) => Ok(converter.convert(value)),
        }
    }

    fn convert_back(&self, value: V) -> Result<P, ConversionError> {
        match self {
            Self::Identity(_) => cast(value),
            Self::Custom(converter) => converter.convert_back(value),
        }
    }
}

/// Move `value` into `B` when `A` and `B` are the same type.
fn cast<A: 'static, B: 'static>(value: A) -> Result<B, ConversionError> {
    let mut slot = Some(value);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<B>>()
        .and_then(Option::take)
        .ok_or_else(|| {
            ConversionError::new(format!("{} is not {}", type_name::<A>(), type_name::<B>()))
        })
}

/// Clears the re-entrancy flag when a write completes.
struct UpdateGuard<'a>(&'a AtomicBool);

impl<'a> UpdateGuard<'a> {
    /// `None` if an update is already running.
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Attached {
    model_listener: ListenerId,
    widget_listener: ListenerId,
}

struct BindingCore<VM, P, V> {
    view_model: Arc<VM>,
    accessor: PropertyAccessor<VM, P>,
    widget: Arc<dyn Widget<V>>,
    conversion: Conversion<P, V>,
    updating: AtomicBool,
    attached: Mutex<Option<Attached>>,
}

impl<VM, P, V> BindingCore<VM, P, V>
where
    VM: ViewModel,
    P: Send + 'static,
    V: Send + 'static,
{
    fn write_view(&self) {
        let Some(_guard) = UpdateGuard::enter(&self.updating) else {
            return;
        };

        let value = self.accessor.get(&self.view_model);
        match self.conversion.convert(value) {
            Ok(value) => self.widget.set_value(value),
            Err(e) => warn!(property = self.accessor.name(), error = %e, "Cannot update widget"),
        }
    }

    fn write_property(&self) {
        let Some(_guard) = UpdateGuard::enter(&self.updating) else {
            return;
        };

        if !self.accessor.is_writable() {
            debug!(
                property = self.accessor.name(),
                "Widget edit ignored by one-way binding"
            );
            return;
        }

        match self.conversion.convert_back(self.widget.value()) {
            Ok(value) => {
                self.accessor.set(&self.view_model, value);
            }
            Err(e) => warn!(
                property = self.accessor.name(),
                error = %e,
                "Widget value rejected, view-model unchanged"
            ),
        }
    }
}

/// Two-way link between a view-model property of type `P` and a widget
/// value of type `V`.
///
/// Dropping the binding unbinds it.
pub struct PropertyBinding<VM, P, V>
where
    VM: ViewModel,
    P: Send + 'static,
    V: Send + 'static,
{
    core: Arc<BindingCore<VM, P, V>>,
}

impl<VM, P, V> PropertyBinding<VM, P, V>
where
    VM: ViewModel,
    P: Send + 'static,
    V: Send + 'static,
{
    /// Binding without a converter; `P` and `V` must be the same type.
    pub fn new<W>(view_model: Arc<VM>, accessor: PropertyAccessor<VM, P>, widget: Arc<W>) -> Self
    where
        W: Widget<V> + 'static,
    {
        Self::with_conversion(view_model, accessor, widget, Conversion::Identity(PhantomData))
    }

    /// Binding through `converter`.
    pub fn with_converter<W, C>(
        view_model: Arc<VM>,
        accessor: PropertyAccessor<VM, P>,
        widget: Arc<W>,
        converter: C,
    ) -> Self
    where
        W: Widget<V> + 'static,
        C: Converter<P, V> + 'static,
    {
        Self::with_conversion(
            view_model,
            accessor,
            widget,
            Conversion::Custom(Arc::new(converter)),
        )
    }

    fn with_conversion(
        view_model: Arc<VM>,
        accessor: PropertyAccessor<VM, P>,
        widget: Arc<dyn Widget<V>>,
        conversion: Conversion<P, V>,
    ) -> Self {
        Self {
            core: Arc::new(BindingCore {
                view_model,
                accessor,
                widget,
                conversion,
                updating: AtomicBool::new(false),
                attached: Mutex::new(None),
            }),
        }
    }

    /// Push the view-model value into the widget and attach both listeners.
    ///
    /// Binding an already bound binding does nothing.
    pub fn bind(&self) -> Result<(), BindingError> {
        let mut attached = self.core.attached.lock();
        if attached.is_some() {
            return Ok(());
        }

        if matches!(self.core.conversion, Conversion::Identity(_))
            && TypeId::of::<P>() != TypeId::of::<V>()
        {
            return Err(BindingError::IncompatibleBindingTypes {
                property: self.core.accessor.name(),
                model: type_name::<P>(),
                widget: type_name::<V>(),
            });
        }

        self.core.write_view();

        let property = self.core.accessor.name();
        let weak: Weak<BindingCore<VM, P, V>> = Arc::downgrade(&self.core);
        let model_listener = self
            .core
            .view_model
            .notifier()
            .subscribe(move |change: &PropertyChange| {
                if !change.affects(property) {
                    return;
                }
                if let Some(core) = weak.upgrade() {
                    core.write_view();
                }
            });

        let weak: Weak<BindingCore<VM, P, V>> = Arc::downgrade(&self.core);
        let widget_listener = self.core.widget.on_changed(Arc::new(move || {
            if let Some(core) = weak.upgrade() {
                core.write_property();
            }
        }));

        *attached = Some(Attached {
            model_listener,
            widget_listener,
        });
        debug!(property, "Property bound");
        Ok(())
    }

    /// Detach both listeners. Safe to call when not bound.
    pub fn unbind(&self) {
        let Some(attached) = self.core.attached.lock().take() else {
            return;
        };
        self.core
            .view_model
            .notifier()
            .unsubscribe(attached.model_listener);
        self.core.widget.remove_listener(attached.widget_listener);
        debug!(property = self.core.accessor.name(), "Property unbound");
    }

    /// Whether the listeners are attached.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.core.attached.lock().is_some()
    }

    /// Re-read the view-model and push the value to the widget.
    pub fn refresh(&self) {
        self.core.write_view();
    }

    /// The bound view-model.
    #[must_use]
    pub fn view_model(&self) -> &Arc<VM> {
        &self.core.view_model
    }
}

impl<VM, P, V> Binding for PropertyBinding<VM, P, V>
where
    VM: ViewModel,
    P: Send + 'static,
    V: Send + 'static,
{
    fn bind(&self) -> Result<(), BindingError> {
        PropertyBinding::bind(self)
    }

    fn unbind(&self) {
        PropertyBinding::unbind(self);
    }

    fn is_bound(&self) -> bool {
        PropertyBinding::is_bound(self)
    }

    fn property(&self) -> &'static str {
        self.core.accessor.name()
    }
}

impl<VM, P, V> Drop for PropertyBinding<VM, P, V>
where
    VM: ViewModel,
    P: Send + 'static,
    V: Send + 'static,
{
    fn drop(&mut self) {
        self.unbind();
    }
}

impl<VM, P, V> fmt::Debug for PropertyBinding<VM, P, V>
where
    VM: ViewModel,
    P: Send + 'static,
    V: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("property", &self.core.accessor.name())
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// The bindings of one view, bound and unbound together.
#[derive(Default)]
pub struct BindingSet {
    bindings: Vec<Box<dyn Binding>>,
}

impl BindingSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    pub fn add(&mut self, binding: impl Binding + 'static) -> &mut Self {
        self.bindings.push(Box::new(binding));
        self
    }

    /// Bind every member. On failure every member is unbound again.
    pub fn bind_all(&self) -> Result<(), BindingError> {
        for binding in &self.bindings {
            if let Err(e) = binding.bind() {
                self.unbind_all();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Unbind every member.
    pub fn unbind_all(&self) {
        for binding in &self.bindings {
            binding.unbind();
        }
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for BindingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|b| (b.property(), b.is_bound())))
            .finish()
    }
}
