//! Handler: start_trip

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::dispatch::Context;
use crate::protocol::{Action, CommandResult};
use crate::store::RecordStore;
use crate::trips::StartTrip;

pub const ACTION: Action = Action::StartTrip;

#[derive(Deserialize)]
pub struct Input {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub trip_id: Option<String>,
}

pub fn guard<S>(ctx: &Context<S>) -> bool {
    ctx.has_actor() && ctx.has_fields(&["title"])
}

pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
    let input = ctx.input::<Input>()?;

    // a redelivered command carries the same correlation id, so it maps to
    // the same trip: refused while running, and by the store once finished
    let trip_id = input
        .trip_id
        .or_else(|| ctx.correlation_id().map(str::to_string))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let started = ctx.trips().start_trip(StartTrip {
        trip_id,
        owner: ctx.actor().to_string(),
        title: input.title,
        content: input.content,
    })?;

    Ok(json!({
        "message": format!("User {} has started trip!", ctx.actor()),
        "trip_id": started.trip_id,
        "state": started.state,
    }))
}
