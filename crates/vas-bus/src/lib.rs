//! # VAS Bus - Events Broker for Cross-Component Communication
//!
//! Screens, controllers and services never call each other directly to react
//! to user input or state changes; they publish plain event records onto the
//! [`EventsBroker`] and subscribe to the kinds they care about.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  View layer  │                    │  Controller  │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │EventsBroker  │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe::<E>()
//! ```
//!
//! ## Delivery Rules
//!
//! - Delivery is keyed by the event's concrete type. There is no fan-out to
//!   "base" kinds.
//! - Handlers for one event run in subscription order.
//! - A failing (or panicking) handler never prevents its siblings from
//!   running. `publish` logs failures; `publish_async` also reports them.
//! - No replay: a handler only sees events published after it subscribed.
//! - Synchronous and asynchronous handlers live in separate tables.
//!   `publish` reaches the former, `publish_async` the latter. Ordering
//!   between a `publish` and a concurrently in-flight `publish_async` of the
//!   same kind is undefined.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod broker;
pub mod events;
pub mod subscriber;

// Re-export main types
pub use broker::{
    async_handler, handler, AsyncHandler, BrokerError, Event, EventsBroker, Handler,
    HandlerFailure, HandlerResult,
};
pub use events::NavigationEvent;
pub use subscriber::{DeliveryMode, EventStream, SubscriptionId, SubscriptionToken};
