//! Record store - persistence target of the command handlers.
//!
//! Handlers and trip generators only see the [`RecordStore`] trait; the
//! crate ships [`InMemoryRecordStore`] for tests and single-process use.
//! A database-backed store implements the same trait.

mod error;
mod in_memory;
mod model;

pub use error::StoreError;
pub use in_memory::InMemoryRecordStore;
pub use model::{
    credential_hash, NewTrip, NewUser, TelemetrySample, TripHandle, TripRecord, UserPatch,
    UserRecord,
};

/// Narrow persistence interface used by the core.
///
/// Implementations must be safe to call from many threads at once: the
/// dispatcher's workers and every trip generator share one store.
pub trait RecordStore: Send + Sync + 'static {
    /// Insert a user. Fails with `DuplicateKey` if the username or email is taken.
    fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    fn get_user(&self, username: &str) -> Result<UserRecord, StoreError>;

    /// Apply a partial update and return the new record.
    fn update_user(&self, username: &str, patch: UserPatch) -> Result<UserRecord, StoreError>;

    fn delete_user(&self, username: &str) -> Result<(), StoreError>;

    /// Create a trip record linked to an existing user. Fails with
    /// `DuplicateKey` if a record with the same trip id exists, finished or not.
    fn create_trip(&self, trip: NewTrip) -> Result<TripHandle, StoreError>;

    /// Append one sample to a trip. Fails if the trip or its owner is gone.
    fn append_telemetry(&self, trip: &TripHandle, sample: TelemetrySample) -> Result<(), StoreError>;

    fn get_trip(&self, trip: &TripHandle) -> Result<TripRecord, StoreError>;

    /// All trips of a user, newest first.
    fn trips_for(&self, owner: &str) -> Result<Vec<TripRecord>, StoreError>;
}
