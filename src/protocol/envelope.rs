//! Command envelopes and their wire form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Action;
use crate::bus::{Message, TransportError};
use crate::error::CommandError;

/// Body of a command message as it travels on the work queue.
///
/// `action` stays a plain string here so an unrecognised name can be
/// answered with `UnknownAction` instead of failing as a decode error.
#[derive(Debug, Serialize, Deserialize)]
struct WireCommand {
    action: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    body: Map<String, Value>,
}

/// A command addressed to the backend worker.
///
/// Created by the caller, consumed once by the dispatcher, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    pub action: Action,
    /// Username the command acts on behalf of.
    pub actor: String,
    pub payload: Map<String, Value>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
}

impl CommandEnvelope {
    /// Create an envelope with no correlation id or reply queue yet.
    pub fn new(action: Action, actor: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            action,
            actor: actor.into(),
            payload,
            correlation_id: None,
            reply_to: None,
        }
    }

    /// Serialize into a message, moving the correlation id and reply queue
    /// into message properties.
    pub fn to_message(&self) -> Result<Message, TransportError> {
        let wire = WireCommand {
            action: self.action.as_str().to_string(),
            username: self.actor.clone(),
            body: self.payload.clone(),
        };
        let mut message = Message::encode_json(Uuid::new_v4().to_string(), &wire)?;
        message.correlation_id = self.correlation_id.clone();
        message.reply_to = self.reply_to.clone();
        Ok(message)
    }

    /// Parse a message taken off the work queue.
    pub fn from_message(message: &Message) -> Result<Self, CommandError> {
        let wire: WireCommand = message.decode_json()?;
        let action = wire.action.parse::<Action>()?;
        Ok(Self {
            action,
            actor: wire.username,
            payload: wire.body,
            correlation_id: message.correlation_id.clone(),
            reply_to: message.reply_to.clone(),
        })
    }
}

/// Turn a JSON value into a payload map. `null` becomes an empty payload.
pub fn payload_from(value: Value) -> Result<Map<String, Value>, CommandError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(CommandError::Validation(format!(
            "payload must be a JSON object, got {other}"
        ))),
    }
}
