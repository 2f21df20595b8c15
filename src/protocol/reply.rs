//! Reply messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::bus::{Message, TransportError};
use crate::error::CommandError;

/// Outcome of one command. Every envelope produces exactly one.
pub type CommandResult = Result<Value, CommandError>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WireReply {
    Ok(Value),
    Err(CommandError),
}

/// Build the reply message for a request, echoing its correlation id.
pub fn encode_reply(correlation_id: Option<&str>, result: &CommandResult) -> Result<Message, TransportError> {
    let wire = match result {
        Ok(value) => WireReply::Ok(value.clone()),
        Err(err) => WireReply::Err(err.clone()),
    };
    let mut message = Message::encode_json(Uuid::new_v4().to_string(), &wire)?;
    message.correlation_id = correlation_id.map(str::to_string);
    Ok(message)
}

/// Read the command result out of a reply message.
pub fn decode_reply(message: &Message) -> CommandResult {
    match message.decode_json::<WireReply>()? {
        WireReply::Ok(value) => Ok(value),
        WireReply::Err(err) => Err(err),
    }
}
