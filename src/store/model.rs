//! Records kept by the record store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// A driver profile.
///
/// `username` and `email` are unique across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub credential_hash: String,
    pub age: u32,
    pub car: String,
    #[serde(rename = "driving_exp")]
    pub driving_experience: u32,
    #[serde(rename = "date_created")]
    pub created_at: DateTime<Utc>,
    /// Bumped on every successful update.
    pub version: u64,
}

/// Fields required to create a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub age: u32,
    pub car: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub driving_exp: u32,
}

impl NewUser {
    /// Check the fields the store relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        validate_email(&self.email)
    }
}

/// Partial update of a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub age: Option<u32>,
    pub car: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub driving_exp: Option<u32>,
    /// When set, the update only applies if the stored version matches.
    pub expected_version: Option<u64>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.age.is_none()
            && self.car.is_none()
            && self.driving_exp.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.email {
            Some(email) => validate_email(email),
            None => Ok(()),
        }
    }
}

/// Store-assigned identifier of a trip record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripHandle(pub String);

impl fmt::Display for TripHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields required to create a trip record.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub trip_id: String,
    pub owner: String,
    pub title: String,
    pub content: String,
}

/// A persisted trip and the telemetry collected for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub handle: TripHandle,
    pub trip_id: String,
    /// Username of the driver.
    pub owner: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "trip_gps")]
    pub telemetry: Vec<TelemetrySample>,
    #[serde(rename = "date_created")]
    pub created_at: DateTime<Utc>,
}

/// One simulated observation of a running trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub trip_id: String,
    pub timestamp: DateTime<Utc>,
    /// km/h
    pub speed: f64,
    pub penalty_points: u32,
}

/// Digest stored in place of the password.
///
/// Salted with the username so equal passwords do not share a digest. This
/// is not a password-hashing scheme.
pub fn credential_hash(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn validate_email(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(format!("invalid email address: {email}")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u32),
    Text(String),
}

impl NumberOrString {
    fn into_u32<E: serde::de::Error>(self) -> Result<u32, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a non-negative integer, got {s:?}"))),
        }
    }
}

// Front-ends forward query strings, so numbers may arrive as text.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_u32()
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_u32)
        .transpose()
}
