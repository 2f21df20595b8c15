use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use super::model::{
    credential_hash, NewTrip, NewUser, TelemetrySample, TripHandle, TripRecord, UserPatch,
    UserRecord,
};
use super::{RecordStore, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserRecord>,
    /// email -> username
    emails: HashMap<String, String>,
    trips: HashMap<TripHandle, TripRecord>,
    /// trip_id -> handle
    trip_ids: HashMap<String, TripHandle>,
    trip_seq: u64,
}

/// Record store kept in process memory.
///
/// Cloning creates another handle to the same storage. Every operation
/// runs under one table lock, so a read-modify-write such as
/// `update_user` is atomic with respect to other calls.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.read("user_count").map(|t| t.users.len()).unwrap_or(0)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut tables = self.write("create_user")?;

        if tables.users.contains_key(&user.username) {
            return Err(StoreError::DuplicateKey {
                field: "username",
                value: user.username,
            });
        }
        if tables.emails.contains_key(&user.email) {
            return Err(StoreError::DuplicateKey {
                field: "email",
                value: user.email,
            });
        }

        let record = UserRecord {
            credential_hash: credential_hash(&user.username, &user.password),
            username: user.username,
            email: user.email,
            age: user.age,
            car: user.car,
            driving_experience: user.driving_exp,
            created_at: Utc::now(),
            version: 1,
        };
        tables
            .emails
            .insert(record.email.clone(), record.username.clone());
        tables.users.insert(record.username.clone(), record.clone());
        Ok(record)
    }

    fn get_user(&self, username: &str) -> Result<UserRecord, StoreError> {
        self.read("get_user")?
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
    }

    fn update_user(&self, username: &str, patch: UserPatch) -> Result<UserRecord, StoreError> {
        let mut tables = self.write("update_user")?;
        let Tables { users, emails, .. } = &mut *tables;

        let user = users
            .get_mut(username)
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))?;

        if let Some(expected) = patch.expected_version {
            if expected != user.version {
                return Err(StoreError::VersionConflict {
                    username: username.to_string(),
                    expected,
                    actual: user.version,
                });
            }
        }

        if let Some(email) = &patch.email {
            if email != &user.email {
                if emails.contains_key(email) {
                    return Err(StoreError::DuplicateKey {
                        field: "email",
                        value: email.clone(),
                    });
                }
                emails.remove(&user.email);
                emails.insert(email.clone(), username.to_string());
                user.email = email.clone();
            }
        }
        if let Some(password) = &patch.password {
            user.credential_hash = credential_hash(username, password);
        }
        if let Some(age) = patch.age {
            user.age = age;
        }
        if let Some(car) = patch.car {
            user.car = car;
        }
        if let Some(driving_exp) = patch.driving_exp {
            user.driving_experience = driving_exp;
        }
        user.version += 1;

        Ok(user.clone())
    }

    fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        let mut tables = self.write("delete_user")?;
        let user = tables
            .users
            .remove(username)
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))?;
        tables.emails.remove(&user.email);
        Ok(())
    }

    fn create_trip(&self, trip: NewTrip) -> Result<TripHandle, StoreError> {
        let mut tables = self.write("create_trip")?;
        if !tables.users.contains_key(&trip.owner) {
            return Err(StoreError::UserNotFound(trip.owner));
        }
        if tables.trip_ids.contains_key(&trip.trip_id) {
            return Err(StoreError::DuplicateKey {
                field: "trip_id",
                value: trip.trip_id,
            });
        }

        tables.trip_seq += 1;
        let handle = TripHandle(format!("trip-{}", tables.trip_seq));
        let record = TripRecord {
            handle: handle.clone(),
            trip_id: trip.trip_id,
            owner: trip.owner,
            title: trip.title,
            content: trip.content,
            telemetry: Vec::new(),
            created_at: Utc::now(),
        };
        tables.trip_ids.insert(record.trip_id.clone(), handle.clone());
        tables.trips.insert(handle.clone(), record);
        Ok(handle)
    }

    fn append_telemetry(&self, trip: &TripHandle, sample: TelemetrySample) -> Result<(), StoreError> {
        let mut tables = self.write("append_telemetry")?;
        let Tables { users, trips, .. } = &mut *tables;

        let record = trips
            .get_mut(trip)
            .ok_or_else(|| StoreError::TripNotFound(trip.to_string()))?;
        if !users.contains_key(&record.owner) {
            return Err(StoreError::UserNotFound(record.owner.clone()));
        }
        record.telemetry.push(sample);
        Ok(())
    }

    fn get_trip(&self, trip: &TripHandle) -> Result<TripRecord, StoreError> {
        self.read("get_trip")?
            .trips
            .get(trip)
            .cloned()
            .ok_or_else(|| StoreError::TripNotFound(trip.to_string()))
    }

    fn trips_for(&self, owner: &str) -> Result<Vec<TripRecord>, StoreError> {
        let tables = self.read("trips_for")?;
        let mut trips: Vec<TripRecord> = tables
            .trips
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }
}
