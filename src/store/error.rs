use thiserror::Error;

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{field} {value} is already taken")]
    DuplicateKey { field: &'static str, value: String },
    #[error("User {0} not found!")]
    UserNotFound(String),
    #[error("trip {0} not found")]
    TripNotFound(String),
    #[error("concurrent write detected for user {username} (expected version {expected}, got {actual})")]
    VersionConflict {
        username: String,
        expected: u64,
        actual: u64,
    },
    #[error("record store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { .. } | StoreError::VersionConflict { .. } => {
                CommandError::Validation(err.to_string())
            }
            StoreError::UserNotFound(_) | StoreError::TripNotFound(_) => {
                CommandError::NotFound(err.to_string())
            }
            StoreError::LockPoisoned(_) | StoreError::Unavailable(_) => {
                CommandError::StoreUnavailable(err.to_string())
            }
        }
    }
}
