//! The type-indexed subscriber table and its dispatch operations.

use crate::channel::{ChannelForwarder, SubscriptionHandle};
use crate::error::{BusError, Result};
use crate::handler::{Entry, Handler};
use crate::types::{Event, EventType, RegistryStats, SubscriptionId};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use tracing::{debug, trace};

/// Default name for async dispatch threads.
const DEFAULT_THREAD_NAME: &str = "typebus-dispatch";

/// Last issued subscription id, shared by every registry in the process.
static LAST_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> SubscriptionId {
    SubscriptionId(LAST_ID.fetch_add(1, Ordering::SeqCst) + 1)
}

/// Registry configuration.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Name given to every thread spawned by `publish_async`.
    pub thread_name: String,

    /// Stack size for async dispatch threads (None = platform default).
    pub stack_size: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }
}

/// Handlers collected for one publish, in registration order.
///
/// Collection stops at the first entry that cannot handle `T`; the handlers
/// before it are still dispatched and the mismatch is reported afterwards.
struct Snapshot<T> {
    handlers: Vec<Arc<dyn Handler<T>>>,
    mismatch: Option<BusError>,
}

impl<T> Snapshot<T> {
    fn finish(self) -> Result<()> {
        match self.mismatch {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Decrements the in-flight counter when an async invocation ends, panics included.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Maps event types to their ordered subscribers.
///
/// Subscribing and unsubscribing take the write lock; publishing takes the
/// read lock only long enough to snapshot the handler list, then dispatches
/// with no lock held. Handlers may therefore publish or (un)subscribe
/// from inside `on_event`.
pub struct Registry {
    table: RwLock<HashMap<TypeId, Vec<Entry>>>,
    in_flight: Arc<AtomicUsize>,
    config: RegistryConfig,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with custom async dispatch settings.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    // --- Subscriptions ---

    /// Register `handler` for events of type `T`.
    ///
    /// Handlers fire in the order they were subscribed. The returned id is
    /// never reused by any registry in this process.
    pub fn subscribe<T, H>(&self, handler: H) -> SubscriptionId
    where
        T: Event,
        H: Handler<T>,
    {
        self.insert::<T>(Arc::new(handler))
    }

    /// Subscribe a channel that receives a clone of every `T` published.
    pub fn subscribe_channel<T>(&self) -> SubscriptionHandle<T>
    where
        T: Event + Clone,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let id = self.insert::<T>(Arc::new(ChannelForwarder::new(sender)));
        SubscriptionHandle { id, receiver }
    }

    fn insert<T: Event>(&self, handler: Arc<dyn Handler<T>>) -> SubscriptionId {
        let event_type = EventType::of::<T>();
        let mut table = self.table.write();

        let id = next_id();
        table
            .entry(event_type.id)
            .or_default()
            .push(Entry::new(id, handler));

        trace!(event = event_type.name, id = id.0, "subscribed");
        id
    }

    /// Remove the subscription `id` previously registered for `T`.
    ///
    /// Returns false if `T` has no such subscription. The remaining handlers
    /// keep their relative order.
    pub fn unsubscribe<T: Event>(&self, id: SubscriptionId) -> bool {
        let event_type = EventType::of::<T>();
        let mut table = self.table.write();

        let Some(entries) = table.get_mut(&event_type.id) else {
            return false;
        };
        let Some(pos) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        entries.remove(pos);

        trace!(event = event_type.name, id = id.0, "unsubscribed");
        true
    }

    /// Number of handlers currently subscribed for `T`.
    pub fn handler_count<T: Event>(&self) -> usize {
        self.table
            .read()
            .get(&TypeId::of::<T>())
            .map_or(0, Vec::len)
    }

    /// Whether publishing a `T` would reach at least one handler.
    pub fn has_handlers<T: Event>(&self) -> bool {
        self.handler_count::<T>() > 0
    }

    /// Drop every subscription. Ids keep counting up from where they were.
    pub fn clear(&self) {
        let mut table = self.table.write();
        let removed: usize = table.values().map(Vec::len).sum();
        table.clear();
        debug!(removed, "registry cleared");
    }

    /// Get registry statistics.
    pub fn stats(&self) -> RegistryStats {
        let table = self.table.read();
        RegistryStats {
            event_types: table.len(),
            subscriptions: table.values().map(Vec::len).sum(),
            async_in_flight: self.in_flight.load(Ordering::SeqCst),
        }
    }

    // --- Publishing ---

    /// Call every handler for `T` in registration order, on this thread.
    ///
    /// Fails with [`BusError::NoHandlers`] if nothing is subscribed for `T`.
    /// A [`BusError::HandlerTypeMismatch`] stops the fan-out at the offending
    /// entry; handlers before it have already run. Panics raised by handlers
    /// propagate to the caller.
    pub fn publish<T: Event>(&self, event: &T) -> Result<()> {
        let snapshot = self.snapshot::<T>()?;

        trace!(
            event = EventType::of::<T>().name,
            handlers = snapshot.handlers.len(),
            "publishing"
        );
        for handler in &snapshot.handlers {
            handler.on_event(event);
        }

        snapshot.finish()
    }

    /// Like [`publish`](Self::publish), but panics on failure.
    pub fn must_publish<T: Event>(&self, event: &T) {
        if let Err(err) = self.publish(event) {
            panic!("{err}");
        }
    }

    /// Run every handler for `T` on its own thread and return without waiting.
    ///
    /// Lookup and type checks behave as in [`publish`](Self::publish). A
    /// failure stops scheduling of later handlers but never cancels the ones
    /// already started. Handler panics stay on the handler's thread.
    pub fn publish_async<T: Event>(&self, event: T) -> Result<()> {
        let snapshot = self.snapshot::<T>()?;

        trace!(
            event = EventType::of::<T>().name,
            handlers = snapshot.handlers.len(),
            "publishing async"
        );
        let event = Arc::new(event);
        for handler in &snapshot.handlers {
            self.spawn(Arc::clone(handler), Arc::clone(&event))?;
        }

        snapshot.finish()
    }

    /// Like [`publish_async`](Self::publish_async), but panics on failure.
    pub fn must_publish_async<T: Event>(&self, event: T) {
        if let Err(err) = self.publish_async(event) {
            panic!("{err}");
        }
    }

    /// Collect the typed handlers for `T` under the read lock.
    fn snapshot<T: Event>(&self) -> Result<Snapshot<T>> {
        let event_type = EventType::of::<T>();
        let table = self.table.read();

        let entries = table
            .get(&event_type.id)
            .filter(|entries| !entries.is_empty())
            .ok_or(BusError::NoHandlers(event_type.name))?;

        let mut handlers = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.typed::<T>() {
                Some(handler) => handlers.push(handler),
                None => {
                    return Ok(Snapshot {
                        handlers,
                        mismatch: Some(BusError::HandlerTypeMismatch(event_type.name)),
                    });
                }
            }
        }

        Ok(Snapshot {
            handlers,
            mismatch: None,
        })
    }

    fn spawn<T: Event>(&self, handler: Arc<dyn Handler<T>>, event: Arc<T>) -> Result<()> {
        let guard = InFlight::enter(&self.in_flight);

        let mut builder = thread::Builder::new().name(self.config.thread_name.clone());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        builder.spawn(move || {
            let _guard = guard;
            handler.on_event(&event);
        })?;
        Ok(())
    }

    /// File `handler` under `U`'s key while it only accepts `T`.
    #[cfg(test)]
    pub(crate) fn insert_mismatched<U: Event, T: Event>(
        &self,
        handler: Arc<dyn Handler<T>>,
    ) -> SubscriptionId {
        let mut table = self.table.write();
        let id = next_id();
        table
            .entry(TypeId::of::<U>())
            .or_default()
            .push(Entry::new(id, handler));
        id
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
