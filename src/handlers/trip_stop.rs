//! Handler: stop_trip

use serde::Deserialize;
use serde_json::json;

use crate::dispatch::Context;
use crate::protocol::{Action, CommandResult};
use crate::store::RecordStore;

pub const ACTION: Action = Action::StopTrip;

#[derive(Deserialize)]
pub struct Input {
    pub trip_id: String,
}

pub fn guard<S>(ctx: &Context<S>) -> bool {
    ctx.has_actor() && ctx.has_fields(&["trip_id"])
}

pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
    let input = ctx.input::<Input>()?;
    let state = ctx.trips().stop_trip(&input.trip_id)?;

    Ok(json!({
        "message": format!("User {} has stopped trip!", ctx.actor()),
        "trip_id": input.trip_id,
        "state": state,
    }))
}
