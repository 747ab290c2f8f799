//! Append-only, multi-keyed limitation registry.

use std::collections::HashMap;

use crate::limitation::Limitation;

/// Limitations in insertion order, indexed by name.
///
/// Lookups by name return the matching records in insertion order; the
/// registry is never edited in place, only rebuilt.
#[derive(Debug, Clone)]
pub struct LicenseLimitations<T> {
    all: Vec<T>,
    by_name: HashMap<String, Vec<usize>>,
}

impl<T> Default for LicenseLimitations<T> {
    fn default() -> Self {
        Self {
            all: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: Limitation> LicenseLimitations<T> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a limitation.
    pub fn add_limitation(&mut self, limitation: T) {
        let index = self.all.len();
        self.by_name
            .entry(limitation.name().to_string())
            .or_default()
            .push(index);
        self.all.push(limitation);
    }

    /// Limitations named `name`, or all of them when `name` is `None`.
    #[must_use]
    pub fn get_limitations(&self, name: Option<&str>) -> Vec<&T> {
        match name {
            None => self.all.iter().collect(),
            Some(name) => self
                .by_name
                .get(name)
                .map(|indices| indices.iter().map(|&i| &self.all[i]).collect())
                .unwrap_or_default(),
        }
    }

    /// Whether any limitation is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Total number of limitations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

impl<T: Limitation> FromIterator<T> for LicenseLimitations<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut registry = Self::new();
        for limitation in iter {
            registry.add_limitation(limitation);
        }
        registry
    }
}
