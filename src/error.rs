use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bus::TransportError;

/// Failure outcome of a command, as seen by the caller.
///
/// Serialized into reply messages as `{"kind": "...", "message": "..."}` so
/// the caller can rebuild the same variant on its side of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum CommandError {
    /// Missing field, bad value or duplicate unique key.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Unknown username or trip.
    #[error("{0}")]
    NotFound(String),
    /// A trip with this id is already active.
    #[error("trip {0} is already running")]
    AlreadyRunning(String),
    /// No reply arrived before the deadline.
    #[error("no reply within {waited_ms} ms")]
    Timeout { waited_ms: u64 },
    /// No handler registered for the action.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// The record store could not serve the request.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),
    /// Too many trips are active at once.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
    /// A message body could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),
    /// The request could not be handed to the broker.
    #[error("transport error: {0}")]
    Transport(String),
    /// The handler failed unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TransportError> for CommandError {
    fn from(err: TransportError) -> Self {
        CommandError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_form_is_tagged() {
        let value = serde_json::to_value(CommandError::NotFound("User bob not found!".into())).unwrap();
        assert_eq!(value, json!({ "kind": "not_found", "message": "User bob not found!" }));

        let value = serde_json::to_value(CommandError::Timeout { waited_ms: 250 }).unwrap();
        assert_eq!(value, json!({ "kind": "timeout", "message": { "waited_ms": 250 } }));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            CommandError::AlreadyRunning("t-1".into()).to_string(),
            "trip t-1 is already running"
        );
        assert_eq!(
            CommandError::UnknownAction("fly".into()).to_string(),
            "unknown action: fly"
        );
    }

    #[test]
    fn transport_errors_convert() {
        let err: CommandError = TransportError::Unroutable("fm_actions_queue".into()).into();
        assert_eq!(
            err,
            CommandError::Transport("no route to queue fm_actions_queue".into())
        );
    }
}
