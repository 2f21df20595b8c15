//! Dispatcher: action handler registry and dispatch.
//!
//! `Dispatcher<S>` holds the record store, the trip session manager and a
//! table of handlers keyed by [`Action`]. Each handler receives a
//! `Context<S>` and returns a [`CommandResult`].
//!
//! ## Example
//!
//! ```ignore
//! let dispatcher = Dispatcher::new(store, trips)
//!     .command(Action::ReadUser, |ctx| {
//!         let user = ctx.store().get_user(ctx.actor())?;
//!         Ok(serde_json::to_value(user)?)
//!     });
//!
//! let result = dispatcher.handle(&envelope);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info_span, warn};

use super::context::Context;
use crate::error::CommandError;
use crate::handlers;
use crate::protocol::{Action, CommandEnvelope, CommandResult};
use crate::store::RecordStore;
use crate::trips::TripSessionManager;

type Guard<S> = Box<dyn Fn(&Context<'_, S>) -> bool + Send + Sync>;
type Handle<S> = Box<dyn Fn(&Context<'_, S>) -> CommandResult + Send + Sync>;

/// A registered action handler with optional guard.
struct CommandHandler<S> {
    guard: Option<Guard<S>>,
    handle: Handle<S>,
}

/// Routes command envelopes to handler functions by action.
///
/// Invocations share no mutable state except through the record store and
/// the trip session manager, so one dispatcher can serve many worker
/// threads at once.
pub struct Dispatcher<S> {
    store: Arc<S>,
    trips: Arc<TripSessionManager<S>>,
    handlers: HashMap<Action, CommandHandler<S>>,
}

impl<S: RecordStore> Dispatcher<S> {
    /// Create a dispatcher with no handlers.
    pub fn new(store: Arc<S>, trips: Arc<TripSessionManager<S>>) -> Self {
        Self {
            store,
            trips,
            handlers: HashMap::new(),
        }
    }

    /// Create a dispatcher with the user and trip handlers registered.
    pub fn standard(store: Arc<S>, trips: Arc<TripSessionManager<S>>) -> Self {
        crate::register_handlers!(
            Self::new(store, trips),
            handlers::user_create,
            handlers::user_read,
            handlers::user_update,
            handlers::user_delete,
            handlers::trip_start,
            handlers::trip_stop,
        )
    }

    /// Register an action handler.
    ///
    /// Returns `self` for chaining.
    pub fn command<F>(mut self, action: Action, handler: F) -> Self
    where
        F: Fn(&Context<'_, S>) -> CommandResult + Send + Sync + 'static,
    {
        self.handlers.insert(
            action,
            CommandHandler {
                guard: None,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register an action handler with a guard function.
    ///
    /// The guard runs first; if it returns `false` the command is rejected
    /// with `CommandError::Validation` and the handler never runs.
    pub fn command_guarded<G, F>(mut self, action: Action, guard: G, handler: F) -> Self
    where
        G: Fn(&Context<'_, S>) -> bool + Send + Sync + 'static,
        F: Fn(&Context<'_, S>) -> CommandResult + Send + Sync + 'static,
    {
        self.handlers.insert(
            action,
            CommandHandler {
                guard: Some(Box::new(guard)),
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Handle one envelope. Every failure comes back as `Err`, never a panic.
    pub fn handle(&self, envelope: &CommandEnvelope) -> CommandResult {
        let span = info_span!(
            "dispatch",
            action = %envelope.action,
            actor = %envelope.actor,
            correlation_id = envelope.correlation_id.as_deref().unwrap_or("-"),
        );
        let _entered = span.enter();

        let handler = self
            .handlers
            .get(&envelope.action)
            .ok_or_else(|| CommandError::UnknownAction(envelope.action.to_string()))?;

        let ctx = Context::new(envelope, self.store.as_ref(), self.trips.as_ref());

        if let Some(guard) = &handler.guard {
            if !guard(&ctx) {
                warn!("guard rejected command");
                return Err(CommandError::Validation(format!(
                    "{} is missing required fields",
                    envelope.action
                )));
            }
        }

        let result = (handler.handle)(&ctx);
        match &result {
            Ok(_) => debug!("command succeeded"),
            Err(err) => warn!(error = %err, "command failed"),
        }
        result
    }

    /// List registered actions.
    pub fn actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.handlers.contains_key(action))
            .collect()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn trips(&self) -> &Arc<TripSessionManager<S>> {
        &self.trips
    }
}
