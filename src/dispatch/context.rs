//! Context passed to command handlers.
//!
//! Carries the envelope being handled and references to the record store
//! and trip session manager. Handlers reach everything through it.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::CommandError;
use crate::protocol::{Action, CommandEnvelope};
use crate::trips::TripSessionManager;

/// The context passed to every command handler.
///
/// ## Example
///
/// ```ignore
/// pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
///     let input = ctx.input::<Input>()?;
///     let user = ctx.store().get_user(ctx.actor())?;
///     // ...
/// }
/// ```
pub struct Context<'a, S> {
    envelope: &'a CommandEnvelope,
    store: &'a S,
    trips: &'a TripSessionManager<S>,
}

impl<'a, S> Context<'a, S> {
    pub(crate) fn new(envelope: &'a CommandEnvelope, store: &'a S, trips: &'a TripSessionManager<S>) -> Self {
        Self {
            envelope,
            store,
            trips,
        }
    }

    /// Deserialize the payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, CommandError> {
        serde_json::from_value(Value::Object(self.envelope.payload.clone()))
            .map_err(|e| CommandError::Validation(e.to_string()))
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.envelope.payload
    }

    pub fn action(&self) -> Action {
        self.envelope.action
    }

    /// Username the command was issued for.
    pub fn actor(&self) -> &str {
        &self.envelope.actor
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.envelope.correlation_id.as_deref()
    }

    pub fn store(&self) -> &S {
        self.store
    }

    pub fn trips(&self) -> &TripSessionManager<S> {
        self.trips
    }

    /// Check if the payload contains a field.
    pub fn has_field(&self, field: &str) -> bool {
        self.envelope.payload.contains_key(field)
    }

    /// Check if the payload contains all specified fields.
    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has_field(f))
    }

    pub fn has_actor(&self) -> bool {
        !self.envelope.actor.trim().is_empty()
    }
}
