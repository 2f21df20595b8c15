//! Sender trait for point-to-point messaging.

use super::{Message, TransportError};

/// Trait for sending messages to a named queue (point-to-point).
///
/// Each message is consumed by exactly one listener on the queue
/// (competing consumers).
pub trait Sender: Send + Sync {
    /// Send a message to a named queue.
    ///
    /// Fails with [`TransportError::Unroutable`] when the queue has not been
    /// declared.
    fn send(&self, queue: &str, message: Message) -> Result<(), TransportError>;
}
