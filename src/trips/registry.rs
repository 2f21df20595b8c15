use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::TripSession;
use crate::error::CommandError;

/// Table of active trip sessions, keyed by trip id.
///
/// Shared (via `Arc`) by the session manager and every generator. The map
/// lock only covers insert, lookup and removal; per-trip state lives behind
/// each session's own lock.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<TripSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Each critical section is a single map operation, so the map is never
    // observed half-updated even after a panic.
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<TripSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new session unless its trip id is taken or the table is full.
    pub fn reserve(&self, session: Arc<TripSession>, capacity: usize) -> Result<(), CommandError> {
        let mut sessions = self.sessions();
        if sessions.contains_key(session.trip_id()) {
            return Err(CommandError::AlreadyRunning(session.trip_id().to_string()));
        }
        if sessions.len() >= capacity {
            return Err(CommandError::CapacityExceeded(format!(
                "{} trips already active",
                sessions.len()
            )));
        }
        sessions.insert(session.trip_id().to_string(), session);
        Ok(())
    }

    pub fn get(&self, trip_id: &str) -> Option<Arc<TripSession>> {
        self.sessions().get(trip_id).cloned()
    }

    /// Remove `session` if it is still the one registered under its id.
    pub fn release(&self, session: &Arc<TripSession>) -> bool {
        let mut sessions = self.sessions();
        match sessions.get(session.trip_id()) {
            Some(current) if Arc::ptr_eq(current, session) => {
                sessions.remove(session.trip_id());
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Ids of all registered trips, sorted.
    pub fn trip_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<TripSession>> {
        self.sessions().values().cloned().collect()
    }
}
