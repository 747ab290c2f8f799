//! Value conversion between view-model and widget representations.

use thiserror::Error;

/// A widget value that has no view-model representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conversion failed: {reason}")]
pub struct ConversionError {
    /// Why the value was rejected.
    pub reason: String,
}

impl ConversionError {
    /// Create an error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Bidirectional transform between a view-model type `P` and a widget type `V`.
///
/// `convert` is total. `convert_back` may reject user input.
pub trait Converter<P, V>: Send + Sync {
    /// View-model value to widget value.
    fn convert(&self, value: P) -> V;

    /// Widget value to view-model value.
    fn convert_back(&self, value: V) -> Result<P, ConversionError>;
}

/// A [`Converter`] built from two closures.
pub struct FnConverter<F, B> {
    forward: F,
    back: B,
}

impl<P, V, F, B> Converter<P, V> for FnConverter<F, B>
where
    F: Fn(P) -> V + Send + Sync,
    B: Fn(V) -> Result<P, ConversionError> + Send + Sync,
{
    fn convert(&self, value: P) -> V {
        (self.forward)(value)
    }

    fn convert_back(&self, value: V) -> Result<P, ConversionError> {
        (self.back)(value)
    }
}

/// Build a converter from a forward and a backward closure.
pub fn converter<P, V, F, B>(forward: F, back: B) -> FnConverter<F, B>
where
    F: Fn(P) -> V + Send + Sync,
    B: Fn(V) -> Result<P, ConversionError> + Send + Sync,
{
    FnConverter { forward, back }
}
