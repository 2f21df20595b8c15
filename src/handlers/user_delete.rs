//! Handler: delete_user

use serde_json::json;

use crate::dispatch::Context;
use crate::protocol::{Action, CommandResult};
use crate::store::RecordStore;

pub const ACTION: Action = Action::DeleteUser;

pub fn guard<S>(ctx: &Context<S>) -> bool {
    ctx.has_actor()
}

pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
    ctx.store().delete_user(ctx.actor())?;
    Ok(json!(format!("User {} was deleted!", ctx.actor())))
}
