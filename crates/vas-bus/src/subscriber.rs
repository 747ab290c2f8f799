//! # Subscriptions
//!
//! The receiving side of the broker: subscription identities, the tokens
//! handed back by `subscribe`, and the pull-style [`EventStream`].

use crate::broker::{handler, Event, EventsBroker};
use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Broker-unique identity of a single subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Which handler table a subscription lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Reached by `publish`.
    Sync,
    /// Reached by `publish_async`.
    Async,
}

/// Receipt for one subscription.
///
/// Tokens are plain values: dropping one does not unsubscribe. Pass it to
/// [`EventsBroker::unsubscribe_token`] to revoke the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    id: SubscriptionId,
    type_id: TypeId,
    event_kind: &'static str,
    mode: DeliveryMode,
}

impl SubscriptionToken {
    pub(crate) fn new<E: Event>(id: SubscriptionId, mode: DeliveryMode) -> Self {
        Self {
            id,
            type_id: TypeId::of::<E>(),
            event_kind: type_name::<E>(),
            mode,
        }
    }

    /// Subscription identity.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Type name of the subscribed event kind.
    #[must_use]
    pub fn event_kind(&self) -> &'static str {
        self.event_kind
    }

    /// Handler table the subscription lives in.
    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// A stream of every event of kind `E` published after its creation.
///
/// The stream sits in the synchronous handler table, so it is fed by
/// `publish` and `publish_all`. The subscription is revoked when the stream
/// is dropped.
pub struct EventStream<E: Event + Clone> {
    receiver: mpsc::UnboundedReceiver<E>,
    broker: EventsBroker,
    token: SubscriptionToken,
    _kind: PhantomData<fn() -> E>,
}

impl<E: Event + Clone> EventStream<E> {
    pub(crate) fn attach(broker: &EventsBroker) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<E>();

        let token = broker.subscribe(handler(move |event: &E| {
            // A closed receiver means the stream is being dropped.
            let _ = sender.send(event.clone());
            Ok(())
        }));

        debug!(event_kind = type_name::<E>(), "Event stream attached");

        Self {
            receiver,
            broker: broker.clone(),
            token,
            _kind: PhantomData,
        }
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<E> {
        self.receiver.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        self.receiver.try_recv().ok()
    }
}

impl<E: Event + Clone> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl<E: Event + Clone> Drop for EventStream<E> {
    fn drop(&mut self) {
        self.broker.unsubscribe_token(&self.token);
        debug!(event_kind = type_name::<E>(), "Event stream dropped");
    }
}

impl<E: Event + Clone> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("event_kind", &type_name::<E>())
            .field("token", &self.token)
            .finish()
    }
}
