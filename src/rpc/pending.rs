use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::protocol::CommandResult;

/// Outstanding calls keyed by correlation id.
///
/// Each entry is a one-shot channel. The reply loop completes an entry at
/// most once; the caller removes it when its wait ends either way.
#[derive(Default)]
pub struct PendingCalls {
    calls: Mutex<HashMap<String, SyncSender<CommandResult>>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call and return the receiving end of its completion.
    pub fn register(&self, correlation_id: &str) -> Receiver<CommandResult> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.lock().insert(correlation_id.to_string(), tx);
        rx
    }

    /// Deliver a result. Returns `false` if no call is waiting on the id.
    pub fn complete(&self, correlation_id: &str, result: CommandResult) -> bool {
        match self.lock().remove(correlation_id) {
            Some(tx) => tx.try_send(result).is_ok(),
            None => false,
        }
    }

    pub fn remove(&self, correlation_id: &str) {
        self.lock().remove(correlation_id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SyncSender<CommandResult>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
