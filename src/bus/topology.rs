//! Queue declaration.

use super::TransportError;

/// Properties of a declared queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueOptions {
    /// Survives broker restarts.
    pub durable: bool,
    /// Only the declaring connection may consume it.
    pub exclusive: bool,
    /// Removed once its owner disconnects.
    pub auto_delete: bool,
}

impl QueueOptions {
    /// Shared work queue.
    pub fn durable() -> Self {
        Self {
            durable: true,
            exclusive: false,
            auto_delete: false,
        }
    }

    /// Caller-owned reply queue.
    pub fn ephemeral() -> Self {
        Self {
            durable: false,
            exclusive: true,
            auto_delete: true,
        }
    }
}

/// Trait for declaring and removing queues.
pub trait Topology: Send + Sync {
    /// Declare a named queue. Declaring an existing queue is a no-op.
    fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), TransportError>;

    /// Declare a server-named, exclusive, auto-deleted queue and return its name.
    fn declare_reply_queue(&self) -> Result<String, TransportError>;

    /// Delete a queue and everything still in it.
    fn delete_queue(&self, name: &str) -> Result<(), TransportError>;
}
