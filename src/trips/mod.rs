//! Trip sessions - live telemetry for active trips.
//!
//! [`TripSessionManager`] starts and stops trips. Each running trip gets
//! one generator thread that appends a [`TelemetrySample`] to the trip's
//! record every tick until the trip is stopped.
//!
//! ## Quick Start
//!
//! ```ignore
//! let registry = Arc::new(SessionRegistry::new());
//! let trips = TripSessionManager::new(store.clone(), registry, &config);
//!
//! trips.start_trip(StartTrip {
//!     trip_id: "t-1".into(),
//!     owner: "alice".into(),
//!     title: "commute".into(),
//!     content: String::new(),
//! })?;
//!
//! // ... samples accumulate on the trip record ...
//!
//! trips.stop_trip("t-1")?;
//! ```
//!
//! [`TelemetrySample`]: crate::store::TelemetrySample

mod generator;
mod manager;
mod registry;
mod session;
mod telemetry;

pub use generator::TripReport;
pub use manager::{StartTrip, TripSessionManager, TripStarted};
pub use registry::SessionRegistry;
pub use session::{TripSession, TripState};
pub use telemetry::{classify_penalty, TelemetrySampler};
