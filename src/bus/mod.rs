//! Broker transport - queue messaging abstractions
//!
//! This module provides the traits the rest of the crate uses to talk to a
//! message broker, plus an in-process implementation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 Broker (blanket trait)                        │
//! │  Sender + Listener + Topology + Clone                         │
//! └──────────────────────────────────────────────────────────────┘
//!          │                  │                      │
//!          ▼                  ▼                      ▼
//! ┌────────────────┐ ┌──────────────────┐ ┌─────────────────────┐
//! │ Sender         │ │ Listener         │ │ Topology            │
//! │ send(queue, m) │ │ listen/ack/nack  │ │ declare/delete      │
//! └────────────────┘ └──────────────────┘ └─────────────────────┘
//!                            │
//!                            ▼
//!          ┌───────────────────────────────────────┐
//!          │ InMemoryBroker (included)             │
//!          │ RabbitMQ / other brokers (external)   │
//!          └───────────────────────────────────────┘
//! ```
//!
//! Delivery is at-least-once: a consumer acks only after it has finished
//! with a message, so a crash in between leads to redelivery.

mod error;
mod in_memory_broker;
mod listener;
mod message;
mod sender;
mod topology;

pub use error::TransportError;
pub use in_memory_broker::InMemoryBroker;
pub use listener::Listener;
pub use message::{Delivery, Message, JSON_CONTENT_TYPE};
pub use sender::Sender;
pub use topology::{QueueOptions, Topology};

/// Combined trait for a broker connection that can be shared across threads.
pub trait Broker: Sender + Listener + Topology + Clone + 'static {}

// Blanket implementation
impl<T: Sender + Listener + Topology + Clone + 'static> Broker for T {}
