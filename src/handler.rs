//! Handlers and their type-erased table entries.

use crate::types::{Event, SubscriptionId};
use std::any::Any;
use std::sync::Arc;

/// A callback for exactly one event type.
///
/// Closures taking `&T` implement this automatically:
///
/// ```ignore
/// registry.subscribe::<UserCreated, _>(|event: &UserCreated| {
///     println!("welcome {}", event.name);
/// });
/// ```
pub trait Handler<T>: Send + Sync + 'static {
    fn on_event(&self, event: &T);
}

impl<T, F> Handler<T> for F
where
    F: Fn(&T) + Send + Sync + 'static,
{
    fn on_event(&self, event: &T) {
        self(event)
    }
}

/// One row of the registry table.
///
/// The handler is stored as `Arc<dyn Handler<T>>` behind `dyn Any`, so the
/// table itself does not know `T`.
pub(crate) struct Entry {
    pub(crate) id: SubscriptionId,
    handler: Box<dyn Any + Send + Sync>,
}

impl Entry {
    pub(crate) fn new<T: Event>(id: SubscriptionId, handler: Arc<dyn Handler<T>>) -> Self {
        Self {
            id,
            handler: Box::new(handler),
        }
    }

    /// Recover the typed handler. `None` if this entry was stored for another type.
    pub(crate) fn typed<T: Event>(&self) -> Option<Arc<dyn Handler<T>>> {
        self.handler.downcast_ref::<Arc<dyn Handler<T>>>().cloned()
    }
}
