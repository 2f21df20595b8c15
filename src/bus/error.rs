//! Error type for broker operations.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No queue with this name exists, so the message was not routed.
    #[error("no route to queue {0}")]
    Unroutable(String),
    /// The queue being consumed or settled does not exist.
    #[error("queue not found: {0}")]
    QueueNotFound(String),
    /// Serializing a message body failed.
    #[error("encode failed: {0}")]
    Encode(String),
    /// A lock inside the broker was poisoned by a panicking thread.
    #[error("broker state poisoned during {0}")]
    Poisoned(&'static str),
    /// The connection to the broker is gone.
    #[error("connection closed: {0}")]
    Closed(String),
}
