//! # Events Broker
//!
//! In-process typed publish/subscribe. Handlers are grouped per concrete
//! event type into two tables: synchronous handlers, reached by
//! [`EventsBroker::publish`], and asynchronous handlers, reached by
//! [`EventsBroker::publish_async`].

use crate::subscriber::{DeliveryMode, EventStream, SubscriptionId, SubscriptionToken};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Marker for anything that can travel through the broker.
///
/// Implemented for every `Send + Sync + 'static` type, so event kinds are
/// plain structs with no registration step.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

/// Outcome reported by a handler.
pub type HandlerResult = anyhow::Result<()>;

/// Synchronous handler. Identity (for `unsubscribe`) is the `Arc` allocation.
pub type Handler<E> = Arc<dyn Fn(&E) -> HandlerResult + Send + Sync>;

/// Asynchronous handler. Identity (for `unsubscribe_async`) is the `Arc` allocation.
pub type AsyncHandler<E> = Arc<dyn Fn(Arc<E>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<E, F>(f: F) -> Handler<E>
where
    E: Event,
    F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a future-returning closure as an [`AsyncHandler`].
pub fn async_handler<E, F, Fut>(f: F) -> AsyncHandler<E>
where
    E: Event,
    F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |event| f(event).boxed())
}

/// A single handler that failed during dispatch.
#[derive(Debug, Error)]
#[error("handler {subscription} for {event_kind} failed: {source}")]
pub struct HandlerFailure {
    /// Type name of the event being delivered.
    pub event_kind: &'static str,
    /// The failing subscription.
    pub subscription: SubscriptionId,
    /// What the handler reported (or the panic message).
    #[source]
    pub source: anyhow::Error,
}

/// Errors returned by the broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// One or more async handlers failed. Every handler still ran.
    #[error("{count} of {handlers} async handler(s) for {event_kind} failed", count = .failures.len())]
    HandlerFailures {
        event_kind: &'static str,
        handlers: usize,
        failures: Vec<HandlerFailure>,
    },
}

impl BrokerError {
    /// The individual failures.
    #[must_use]
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            Self::HandlerFailures { failures, .. } => failures,
        }
    }
}

/// Both handler tables for one event kind.
struct HandlerTable<E: Event> {
    sync: Vec<(SubscriptionId, Handler<E>)>,
    asynchronous: Vec<(SubscriptionId, AsyncHandler<E>)>,
}

impl<E: Event> Default for HandlerTable<E> {
    fn default() -> Self {
        Self {
            sync: Vec::new(),
            asynchronous: Vec::new(),
        }
    }
}

/// Type-erased view of a [`HandlerTable`], so tokens can be revoked without
/// knowing the event type.
trait Topic: Send + Sync {
    fn remove(&mut self, id: SubscriptionId, mode: DeliveryMode) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Event> Topic for HandlerTable<E> {
    fn remove(&mut self, id: SubscriptionId, mode: DeliveryMode) -> bool {
        match mode {
            DeliveryMode::Sync => remove_by_id(&mut self.sync, id),
            DeliveryMode::Async => remove_by_id(&mut self.asynchronous, id),
        }
    }

    fn len(&self) -> usize {
        self.sync.len() + self.asynchronous.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn remove_by_id<H>(entries: &mut Vec<(SubscriptionId, H)>, id: SubscriptionId) -> bool {
    match entries.iter().position(|(entry, _)| *entry == id) {
        Some(index) => {
            entries.remove(index);
            true
        }
        None => false,
    }
}

#[derive(Default)]
struct BrokerInner {
    topics: RwLock<HashMap<TypeId, Box<dyn Topic>>>,
    next_id: AtomicU64,
    events_published: AtomicU64,
    handler_failures: AtomicU64,
}

/// Process-wide publish/subscribe bus.
///
/// Cloning is cheap and every clone shares the same subscription table.
/// The table lock is never held while a handler runs, so handlers may
/// subscribe, unsubscribe or publish re-entrantly.
#[derive(Clone, Default)]
pub struct EventsBroker {
    inner: Arc<BrokerInner>,
}

impl EventsBroker {
    /// Create an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a synchronous handler to events of kind `E`.
    ///
    /// Subscribing the same handler twice registers it twice.
    pub fn subscribe<E: Event>(&self, handler: Handler<E>) -> SubscriptionToken {
        let id = self.next_id();
        self.with_table_mut::<E, _>(|table| table.sync.push((id, handler)));
        debug!(event_kind = type_name::<E>(), subscription = %id, "Handler subscribed");
        SubscriptionToken::new::<E>(id, DeliveryMode::Sync)
    }

    /// Subscribe an asynchronous handler to events of kind `E`.
    pub fn subscribe_async<E: Event>(&self, handler: AsyncHandler<E>) -> SubscriptionToken {
        let id = self.next_id();
        self.with_table_mut::<E, _>(|table| table.asynchronous.push((id, handler)));
        debug!(event_kind = type_name::<E>(), subscription = %id, "Async handler subscribed");
        SubscriptionToken::new::<E>(id, DeliveryMode::Async)
    }

    /// Remove the first registration of `handler`.
    ///
    /// Returns whether anything was removed; an unknown handler is a no-op.
    pub fn unsubscribe<E: Event>(&self, handler: &Handler<E>) -> bool {
        let removed = self.with_table_mut::<E, _>(|table| {
            match table.sync.iter().position(|(_, h)| Arc::ptr_eq(h, handler)) {
                Some(index) => {
                    table.sync.remove(index);
                    true
                }
                None => false,
            }
        });
        if removed {
            debug!(event_kind = type_name::<E>(), "Handler unsubscribed");
        }
        removed
    }

    /// Remove the first registration of an async `handler`.
    pub fn unsubscribe_async<E: Event>(&self, handler: &AsyncHandler<E>) -> bool {
        let removed = self.with_table_mut::<E, _>(|table| {
            match table
                .asynchronous
                .iter()
                .position(|(_, h)| Arc::ptr_eq(h, handler))
            {
                Some(index) => {
                    table.asynchronous.remove(index);
                    true
                }
                None => false,
            }
        });
        if removed {
            debug!(event_kind = type_name::<E>(), "Async handler unsubscribed");
        }
        removed
    }

    /// Revoke the subscription behind `token`. Revoking twice is a no-op.
    pub fn unsubscribe_token(&self, token: &SubscriptionToken) -> bool {
        let mut topics = self.inner.topics.write();
        let removed = topics
            .get_mut(&token.type_id())
            .map(|topic| topic.remove(token.id(), token.mode()))
            .unwrap_or(false);
        if removed {
            debug!(
                event_kind = token.event_kind(),
                subscription = %token.id(),
                "Subscription revoked"
            );
        }
        removed
    }

    /// Deliver `event` to every synchronous handler of its kind, in
    /// subscription order, on the caller's thread.
    ///
    /// Failing handlers are logged and counted; they never stop delivery to
    /// the rest. Returns the number of handlers invoked.
    pub fn publish<E: Event>(&self, event: &E) -> usize {
        let handlers = self
            .with_table::<E, _, _>(|table| table.sync.clone())
            .unwrap_or_default();
        self.inner.events_published.fetch_add(1, Ordering::Relaxed);

        for (id, handler) in &handlers {
            let outcome = match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(result) => result,
                Err(payload) => Err(panic_error(payload)),
            };
            if let Err(error) = outcome {
                self.record_failure::<E>(*id, &error);
            }
        }

        debug!(
            event_kind = type_name::<E>(),
            receivers = handlers.len(),
            "Event published"
        );
        handlers.len()
    }

    /// Deliver `event` to every asynchronous handler of its kind and wait for
    /// all of them.
    ///
    /// Handlers are initiated in subscription order and run concurrently, so
    /// completion order is unspecified. Every handler runs even if others
    /// fail; failures are returned together in
    /// [`BrokerError::HandlerFailures`].
    pub async fn publish_async<E: Event>(&self, event: E) -> Result<usize, BrokerError> {
        let handlers = self
            .with_table::<E, _, _>(|table| table.asynchronous.clone())
            .unwrap_or_default();
        self.inner.events_published.fetch_add(1, Ordering::Relaxed);

        let event = Arc::new(event);
        let pending = handlers.iter().map(|(id, handler)| {
            let id = *id;
            let started = catch_unwind(AssertUnwindSafe(|| handler(Arc::clone(&event))));
            async move {
                let outcome = match started {
                    Ok(future) => AssertUnwindSafe(future)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| Err(panic_error(payload))),
                    Err(payload) => Err(panic_error(payload)),
                };
                (id, outcome)
            }
        });
        let results = join_all(pending).await;

        let mut failures = Vec::new();
        for (id, outcome) in results {
            if let Err(error) = outcome {
                self.record_failure::<E>(id, &error);
                failures.push(HandlerFailure {
                    event_kind: type_name::<E>(),
                    subscription: id,
                    source: error,
                });
            }
        }

        debug!(
            event_kind = type_name::<E>(),
            receivers = handlers.len(),
            failed = failures.len(),
            "Event published (async)"
        );

        if failures.is_empty() {
            Ok(handlers.len())
        } else {
            Err(BrokerError::HandlerFailures {
                event_kind: type_name::<E>(),
                handlers: handlers.len(),
                failures,
            })
        }
    }

    /// `publish` followed by `publish_async`, reaching both tables.
    ///
    /// Returns the total number of handlers invoked.
    pub async fn publish_all<E: Event>(&self, event: E) -> Result<usize, BrokerError> {
        let sync = self.publish(&event);
        let asynchronous = self.publish_async(event).await?;
        Ok(sync + asynchronous)
    }

    /// Open a stream of events of kind `E`, fed by `publish`.
    #[must_use]
    pub fn stream<E: Event + Clone>(&self) -> EventStream<E> {
        EventStream::attach(self)
    }

    /// Number of live subscriptions (both tables) for kind `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.inner
            .topics
            .read()
            .get(&TypeId::of::<E>())
            .map(|topic| topic.len())
            .unwrap_or(0)
    }

    /// Total `publish`/`publish_async` calls.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.inner.events_published.load(Ordering::Relaxed)
    }

    /// Total handler failures (errors and panics) observed.
    #[must_use]
    pub fn handler_failures(&self) -> u64 {
        self.inner.handler_failures.load(Ordering::Relaxed)
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn with_table<E: Event, R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&HandlerTable<E>) -> R,
    {
        let topics = self.inner.topics.read();
        topics
            .get(&TypeId::of::<E>())
            .and_then(|topic| topic.as_any().downcast_ref::<HandlerTable<E>>())
            .map(f)
    }

    fn with_table_mut<E: Event, R>(&self, f: impl FnOnce(&mut HandlerTable<E>) -> R) -> R
    where
        R: Default,
    {
        let mut topics = self.inner.topics.write();
        let topic = topics
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(HandlerTable::<E>::default()));
        match topic.as_any_mut().downcast_mut::<HandlerTable<E>>() {
            Some(table) => f(table),
            None => R::default(),
        }
    }

    fn record_failure<E: Event>(&self, id: SubscriptionId, error: &anyhow::Error) {
        self.inner.handler_failures.fetch_add(1, Ordering::Relaxed);
        warn!(
            event_kind = type_name::<E>(),
            subscription = %id,
            error = %error,
            "Event handler failed"
        );
    }
}

impl fmt::Debug for EventsBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventsBroker")
            .field("event_kinds", &self.inner.topics.read().len())
            .field("events_published", &self.events_published())
            .field("handler_failures", &self.handler_failures())
            .finish()
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    anyhow::anyhow!("handler panicked: {message}")
}
