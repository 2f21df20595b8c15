//! Handler: create_user

use serde_json::{json, Value};

use crate::dispatch::Context;
use crate::error::CommandError;
use crate::protocol::{Action, CommandResult};
use crate::store::{NewUser, RecordStore};

pub const ACTION: Action = Action::CreateUser;

pub fn guard<S>(ctx: &Context<S>) -> bool {
    ctx.has_fields(&["email", "password", "age", "car", "driving_exp"])
        && (ctx.has_field("username") || ctx.has_actor())
}

pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
    // the body's username wins; the envelope actor fills it in when absent
    let mut payload = ctx.payload().clone();
    payload
        .entry("username")
        .or_insert_with(|| Value::String(ctx.actor().to_string()));

    let input: NewUser =
        serde_json::from_value(Value::Object(payload)).map_err(|e| CommandError::Validation(e.to_string()))?;
    input.validate().map_err(CommandError::Validation)?;

    let user = ctx.store().create_user(input)?;
    Ok(json!(format!("User {} was created successfully!", user.username)))
}
