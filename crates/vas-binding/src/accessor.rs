//! Typed access to a single view-model property.

use std::fmt;
use std::sync::Arc;

type Getter<VM, P> = Arc<dyn Fn(&VM) -> P + Send + Sync>;
type Setter<VM, P> = Arc<dyn Fn(&VM, P) + Send + Sync>;

/// Getter/setter pair addressing one property of `VM`.
///
/// `name` must match the name the view-model reports in its change
/// notifications. An accessor without a setter yields a one-way binding.
pub struct PropertyAccessor<VM, P> {
    name: &'static str,
    get: Getter<VM, P>,
    set: Option<Setter<VM, P>>,
}

impl<VM, P> PropertyAccessor<VM, P> {
    /// Read/write accessor.
    pub fn new<G, S>(name: &'static str, get: G, set: S) -> Self
    where
        G: Fn(&VM) -> P + Send + Sync + 'static,
        S: Fn(&VM, P) + Send + Sync + 'static,
    {
        Self {
            name,
            get: Arc::new(get),
            set: Some(Arc::new(set)),
        }
    }

    /// Read-only accessor.
    pub fn read_only<G>(name: &'static str, get: G) -> Self
    where
        G: Fn(&VM) -> P + Send + Sync + 'static,
    {
        Self {
            name,
            get: Arc::new(get),
            set: None,
        }
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether values can be written back.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    /// Read the property.
    pub fn get(&self, view_model: &VM) -> P {
        (self.get)(view_model)
    }

    /// Write the property. Returns `false` for a read-only accessor.
    pub fn set(&self, view_model: &VM, value: P) -> bool {
        match &self.set {
            Some(set) => {
                set(view_model, value);
                true
            }
            None => false,
        }
    }
}

impl<VM, P> Clone for PropertyAccessor<VM, P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            get: Arc::clone(&self.get),
            set: self.set.clone(),
        }
    }
}

impl<VM, P> fmt::Debug for PropertyAccessor<VM, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("name", &self.name)
            .field("writable", &self.is_writable())
            .finish()
    }
}
