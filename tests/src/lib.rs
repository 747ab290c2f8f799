//! # VAS Test Suite
//!
//! Cross-crate scenarios exercising the runtime the way an application
//! does: through the public APIs only.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── navigation.rs   # StateController + controllers + broker
//!     ├── binding.rs      # PropertyBinding against live view models
//!     ├── broker.rs       # EventsBroker delivery, streams, failures
//!     └── licensing.rs    # License events gating controller actions
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vas-tests
//! cargo test -p vas-tests integration::navigation::
//! ```

#![allow(dead_code)]

pub mod integration;
