//! Command dispatch - the consuming side of the work queue.
//!
//! ```text
//!   work queue ──► DispatcherThread (listener) ──► WorkerPool
//!                                                    │
//!                         decode ─► Dispatcher::handle(envelope)
//!                                                    │
//!   reply_to   ◄── encode_reply(correlation_id, result) ◄┘
//! ```
//!
//! A delivery is acked only after its reply has been published (or the
//! caller is known to be gone). If the reply cannot be published the
//! delivery is requeued, so commands are handled at least once.
//!
//! ## Quick Start
//!
//! ```ignore
//! let dispatcher = Arc::new(Dispatcher::standard(store, trips));
//! let listener = DispatcherThread::spawn(dispatcher, broker.clone(), &config)?;
//!
//! // ... RpcClient calls are answered ...
//!
//! let stats = listener.stop();
//! ```

mod context;
mod dispatcher;
mod pool;
mod thread;

pub use context::Context;
pub use dispatcher::Dispatcher;
pub use pool::{PoolClosed, WorkerPool};
pub use thread::{DispatchStats, DispatcherThread};
