//! Cross-crate integration scenarios.

pub mod binding;
pub mod broker;
pub mod licensing;
pub mod navigation;
