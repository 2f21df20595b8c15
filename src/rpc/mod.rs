//! RPC client - the calling side of the work queue.
//!
//! ```text
//!   caller thread ──► RpcClient::call
//!                        │  register(correlation_id) in PendingCalls
//!                        │  publish envelope ──► work queue
//!                        │  wait (call_timeout)
//!                        ▼
//!   reply queue ──► reply loop ──► PendingCalls::complete(correlation_id)
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! let client = RpcClient::connect(broker.clone(), &config)?;
//! let reply = client.read_user("alice")?;
//! client.shutdown();
//! ```

mod client;
mod pending;

pub use client::RpcClient;
pub use pending::PendingCalls;
