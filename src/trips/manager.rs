use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use super::generator::{self, TripReport};
use super::{SessionRegistry, TelemetrySampler, TripSession, TripState};
use crate::config::{FmsConfig, MIN_INTERVAL};
use crate::error::CommandError;
use crate::store::{NewTrip, RecordStore, TripHandle};

/// Request to start a trip.
#[derive(Debug, Clone)]
pub struct StartTrip {
    pub trip_id: String,
    pub owner: String,
    pub title: String,
    pub content: String,
}

/// Outcome of a successful start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripStarted {
    pub trip_id: String,
    pub handle: TripHandle,
    pub state: TripState,
}

/// Starts and stops trip sessions and owns their generator threads.
pub struct TripSessionManager<S> {
    store: Arc<S>,
    registry: Arc<SessionRegistry>,
    tick: Duration,
    max_active: usize,
    max_distance_m: u32,
}

impl<S: RecordStore> TripSessionManager<S> {
    pub fn new(store: Arc<S>, registry: Arc<SessionRegistry>, config: &FmsConfig) -> Self {
        Self {
            store,
            registry,
            tick: config.trip_tick_interval.max(MIN_INTERVAL),
            max_active: config.max_active_trips,
            max_distance_m: config.max_distance_per_tick_m,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register a session, create its trip record and launch its generator.
    ///
    /// Fails with `AlreadyRunning` if the trip id is active, `NotFound` if
    /// the owner does not exist, `CapacityExceeded` when the generator limit
    /// is reached. A failed start leaves no session behind.
    pub fn start_trip(&self, request: StartTrip) -> Result<TripStarted, CommandError> {
        let session = Arc::new(TripSession::new(
            request.trip_id.clone(),
            request.owner.clone(),
            request.title.clone(),
            request.content.clone(),
        ));
        self.registry.reserve(session.clone(), self.max_active)?;

        let created = self.store.create_trip(NewTrip {
            trip_id: request.trip_id.clone(),
            owner: request.owner,
            title: request.title,
            content: request.content,
        });
        let handle = match created {
            Ok(handle) => handle,
            Err(err) => {
                session.mark_stopped();
                self.registry.release(&session);
                return Err(err.into());
            }
        };

        if !session.mark_running(handle.clone()) {
            warn!(trip_id = %request.trip_id, "trip stopped before its generator started");
            session.mark_stopped();
            self.registry.release(&session);
            return Ok(TripStarted {
                trip_id: request.trip_id,
                handle,
                state: TripState::Stopped,
            });
        }

        let worker = {
            let session = session.clone();
            let store = self.store.clone();
            let registry = self.registry.clone();
            let tick = self.tick;
            let sampler = TelemetrySampler::new(self.max_distance_m);
            thread::Builder::new()
                .name(format!("trip-{}", request.trip_id))
                .spawn(move || generator::run(session, store, registry, tick, sampler))
        };

        match worker {
            Ok(join) => session.attach_generator(join),
            Err(err) => {
                session.mark_stopped();
                self.registry.release(&session);
                return Err(CommandError::Internal(format!(
                    "failed to spawn telemetry generator: {err}"
                )));
            }
        }

        info!(trip_id = %request.trip_id, handle = %handle, "trip started");
        Ok(TripStarted {
            trip_id: request.trip_id,
            handle,
            state: TripState::Running,
        })
    }

    /// Signal a trip's generator to stop. Returns without waiting for it.
    pub fn stop_trip(&self, trip_id: &str) -> Result<TripState, CommandError> {
        let session = self
            .registry
            .get(trip_id)
            .ok_or_else(|| CommandError::NotFound(format!("trip {trip_id} is not active")))?;
        let state = session.request_stop();
        info!(trip_id, %state, "trip stop requested");
        Ok(state)
    }

    pub fn state(&self, trip_id: &str) -> Option<TripState> {
        self.registry.get(trip_id).map(|session| session.state())
    }

    pub fn active_trips(&self) -> Vec<String> {
        self.registry.trip_ids()
    }

    /// Stop every session and wait for its generator to exit.
    pub fn shutdown(&self) -> Vec<TripReport> {
        let sessions = self.registry.snapshot();
        for session in &sessions {
            session.request_stop();
        }

        sessions
            .into_iter()
            .filter_map(|session| {
                let join = session.take_generator()?;
                Some(join.join().unwrap_or_else(|_| TripReport {
                    trip_id: session.trip_id().to_string(),
                    samples: session.samples(),
                    failure: Some("generator panicked".to_string()),
                }))
            })
            .collect()
    }
}
