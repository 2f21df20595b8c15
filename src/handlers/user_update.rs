//! Handler: update_user
//!
//! Applies a partial update. Unless the payload carries `expected_version`
//! the last write wins.

use serde_json::json;

use crate::dispatch::Context;
use crate::error::CommandError;
use crate::protocol::{Action, CommandResult};
use crate::store::{RecordStore, UserPatch};

pub const ACTION: Action = Action::UpdateUser;

pub fn guard<S>(ctx: &Context<S>) -> bool {
    ctx.has_actor()
}

pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
    let patch = ctx.input::<UserPatch>()?;
    if patch.is_empty() {
        return Err(CommandError::Validation("nothing to update".to_string()));
    }
    patch.validate().map_err(CommandError::Validation)?;

    let user = ctx.store().update_user(ctx.actor(), patch)?;
    Ok(json!({
        "message": format!("User {} was updated successfully!", user.username),
        "version": user.version,
    }))
}
