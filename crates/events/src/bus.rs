//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is how state owners announce changes without holding references to
//! whoever renders them:
//!
//! - **Transport-agnostic**: the in-memory bus uses channels; nothing in the
//!   contract assumes it.
//! - **Broadcast**: every subscription receives its own copy of each message.
//! - **No persistence**: a subscription only sees messages published after it
//!   was created.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

/// A subscription to an event stream.
///
/// ## Usage Pattern
///
/// ```ignore
/// let changes = resolver.subscribe();
///
/// // once per frame
/// for change in changes.drain() {
///     repaint(change.effective);
/// }
/// ```
///
/// Subscriptions are designed for single-threaded consumption. Dropping a
/// subscription unsubscribes it; the bus prunes it on the next publish.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Take every message that is already queued, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish()` can fail (e.g. a poisoned lock). Publishers decide whether that
/// is fatal; the display-mode resolver logs it and keeps its new state, since
/// the state change itself already happened.
///
/// The trait requires `Send + Sync` so a bus can be shared with callbacks that
/// run on whatever thread the environment delivers them on.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
