//! Handler: read_user

use crate::dispatch::Context;
use crate::protocol::{Action, CommandResult};
use crate::store::RecordStore;

pub const ACTION: Action = Action::ReadUser;

pub fn guard<S>(ctx: &Context<S>) -> bool {
    ctx.has_actor()
}

pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
    let user = ctx.store().get_user(ctx.actor())?;
    Ok(serde_json::to_value(user)?)
}
