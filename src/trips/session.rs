//! One live trip.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use serde::Serialize;

use super::generator::TripReport;
use crate::store::TripHandle;

/// Lifecycle of a trip session.
///
/// ```text
/// (absent) ─start─▶ Starting ─record created─▶ Running ─stop─▶ Stopping ─generator exits─▶ Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for TripState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TripState::Starting => "starting",
            TripState::Running => "running",
            TripState::Stopping => "stopping",
            TripState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) state: TripState,
    pub(crate) handle: Option<TripHandle>,
    pub(crate) samples: u64,
}

/// In-memory representation of a trip while telemetry is being generated.
///
/// The state sits behind its own lock, so starting, stopping or ticking
/// one trip never waits on another.
pub struct TripSession {
    trip_id: String,
    owner: String,
    title: String,
    content: String,
    inner: Mutex<SessionState>,
    changed: Condvar,
    generator: Mutex<Option<JoinHandle<TripReport>>>,
}

impl TripSession {
    pub fn new(
        trip_id: impl Into<String>,
        owner: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            owner: owner.into(),
            title: title.into(),
            content: content.into(),
            inner: Mutex::new(SessionState {
                state: TripState::Starting,
                handle: None,
                samples: 0,
            }),
            changed: Condvar::new(),
            generator: Mutex::new(None),
        }
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn state(&self) -> TripState {
        self.lock().state
    }

    /// Store handle of the trip record, once it exists.
    pub fn handle(&self) -> Option<TripHandle> {
        self.lock().handle.clone()
    }

    /// Samples appended so far.
    pub fn samples(&self) -> u64 {
        self.lock().samples
    }

    // The state is a plain enum plus counters; a panic elsewhere cannot
    // leave it half-written, so a poisoned lock is still usable.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn condvar(&self) -> &Condvar {
        &self.changed
    }

    /// Starting -> Running. Returns false if a stop arrived first.
    pub(crate) fn mark_running(&self, handle: TripHandle) -> bool {
        let mut inner = self.lock();
        inner.handle = Some(handle);
        if inner.state != TripState::Starting {
            return false;
        }
        inner.state = TripState::Running;
        true
    }

    /// Ask the generator to stop. Returns the state after the request.
    ///
    /// Does not wait for the generator; it observes the change on its next
    /// wake-up, which this call triggers immediately.
    pub(crate) fn request_stop(&self) -> TripState {
        let mut inner = self.lock();
        if matches!(inner.state, TripState::Starting | TripState::Running) {
            inner.state = TripState::Stopping;
        }
        let state = inner.state;
        drop(inner);
        self.changed.notify_all();
        state
    }

    pub(crate) fn mark_stopped(&self) {
        self.lock().state = TripState::Stopped;
        self.changed.notify_all();
    }

    pub(crate) fn attach_generator(&self, handle: JoinHandle<TripReport>) {
        *self
            .generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    pub(crate) fn take_generator(&self) -> Option<JoinHandle<TripReport>> {
        self.generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl fmt::Debug for TripSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripSession")
            .field("trip_id", &self.trip_id)
            .field("owner", &self.owner)
            .field("state", &self.state())
            .finish()
    }
}
