//! Error types for the registry.

use thiserror::Error;

/// Failures returned by publish operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// Nothing has ever been subscribed for this event type.
    #[error("no handlers registered for event {0}")]
    NoHandlers(&'static str),

    /// An entry filed under this event type cannot consume it.
    #[error("handler is not of type Handler<{0}>")]
    HandlerTypeMismatch(&'static str),

    #[error("failed to spawn async handler: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, BusError>;
