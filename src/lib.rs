//! # Typebus
//!
//! An in-process publish/subscribe registry keyed by event type.
//!
//! Components subscribe a handler for a concrete type; producers publish
//! values of that type. Neither side holds a reference to the other, only to
//! a shared [`Registry`].
//!
//! ## Core Concepts
//!
//! - **Events**: any `'static + Send + Sync` value, routed by its static type
//! - **Handlers**: callbacks for exactly one event type, fired in subscription order
//! - **Dispatch**: synchronous on the caller's thread, or one spawned thread per handler
//!
//! ## Example
//!
//! ```ignore
//! use typebus::Registry;
//!
//! #[derive(Clone)]
//! struct UserCreated {
//!     name: String,
//!     email: String,
//! }
//!
//! let registry = Registry::new();
//!
//! let id = registry.subscribe::<UserCreated, _>(|event: &UserCreated| {
//!     println!("welcome {}", event.name);
//! });
//!
//! registry.publish(&UserCreated {
//!     name: "John Doe".into(),
//!     email: "jdoe@x.com".into(),
//! })?;
//!
//! registry.unsubscribe::<UserCreated>(id);
//! ```

pub mod channel;
pub mod error;
pub mod handler;
pub mod registry;
pub mod types;

// Re-exports
pub use channel::SubscriptionHandle;
pub use error::{BusError, Result};
pub use handler::Handler;
pub use registry::{Registry, RegistryConfig};
pub use types::{Event, EventType, RegistryStats, SubscriptionId};
