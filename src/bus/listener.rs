//! Listener trait for point-to-point messaging.

use std::time::Duration;

use super::{Delivery, TransportError};

/// Trait for consuming a named queue (point-to-point).
///
/// Listeners on the same queue compete; each message goes to one of them.
/// A delivery stays unacked until the consumer settles it, so a consumer
/// that dies before `ack` causes redelivery rather than loss.
pub trait Listener: Send + Sync {
    /// Wait for the next message on a named queue, blocking until one is
    /// available or the timeout expires.
    fn listen(&self, queue: &str, timeout: Duration) -> Result<Option<Delivery>, TransportError>;

    /// Acknowledge that a delivery has been processed.
    fn ack(&self, queue: &str, tag: u64) -> Result<(), TransportError>;

    /// Reject a delivery. With `requeue` it goes back to the head of the
    /// queue and is redelivered; otherwise it is dropped.
    fn nack(&self, queue: &str, tag: u64, requeue: bool) -> Result<(), TransportError>;
}
