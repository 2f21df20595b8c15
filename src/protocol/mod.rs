//! Command protocol shared by callers and the dispatcher.
//!
//! A request is a [`CommandEnvelope`] serialized onto the work queue with
//! `correlation_id` and `reply_to` as message properties. The dispatcher
//! answers with exactly one reply message on `reply_to` carrying the same
//! correlation id and a serialized [`CommandResult`].
//!
//! ```text
//! caller ──(envelope, corr-id, reply-to)──▶ work queue ──▶ dispatcher
//!   ▲                                                        │
//!   └──────────── reply queue ◀──(result, corr-id)───────────┘
//! ```

mod action;
mod envelope;
mod reply;

pub use action::Action;
pub use envelope::{payload_from, CommandEnvelope};
pub use reply::{decode_reply, encode_reply, CommandResult};
