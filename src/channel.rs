//! Channel-backed subscriptions.

use crate::handler::Handler;
use crate::types::SubscriptionId;
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Receiving side of a channel subscription.
///
/// Created by [`Registry::subscribe_channel`](crate::Registry::subscribe_channel).
/// Dropping the handle does not unsubscribe; pass `id` to `unsubscribe`.
pub struct SubscriptionHandle<T> {
    /// Subscription ID.
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: Receiver<T>,
}

impl<T> SubscriptionHandle<T> {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Forwards a clone of every event into a channel.
pub(crate) struct ChannelForwarder<T> {
    sender: Sender<T>,
}

impl<T> ChannelForwarder<T> {
    pub(crate) fn new(sender: Sender<T>) -> Self {
        Self { sender }
    }
}

impl<T> Handler<T> for ChannelForwarder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn on_event(&self, event: &T) {
        // Receiver gone: nothing left to deliver to.
        let _ = self.sender.send(event.clone());
    }
}
