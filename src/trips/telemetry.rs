//! Simulated telemetry.
//!
//! There is no GPS feed: each tick draws the distance the car covered in
//! one second of driving and turns it into a speed.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::store::TelemetrySample;

/// m/s to km/h
const MPS_TO_KMH: f64 = 3.6;

/// Penalty points for a speed in km/h.
///
/// | speed          | points |
/// |----------------|--------|
/// | ≤ 60           | 0      |
/// | (60, 80]       | 1      |
/// | (80, 100]      | 2      |
/// | > 100          | 5      |
pub fn classify_penalty(speed: f64) -> u32 {
    if speed > 100.0 {
        5
    } else if speed > 80.0 {
        2
    } else if speed > 60.0 {
        1
    } else {
        0
    }
}

/// Source of synthetic samples for one trip.
#[derive(Debug)]
pub struct TelemetrySampler {
    rng: StdRng,
    max_distance_m: u32,
    last_timestamp: Option<DateTime<Utc>>,
}

impl TelemetrySampler {
    pub fn new(max_distance_m: u32) -> Self {
        Self::with_rng(StdRng::from_entropy(), max_distance_m)
    }

    /// Deterministic sampler for tests and replays.
    pub fn seeded(max_distance_m: u32, seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), max_distance_m)
    }

    fn with_rng(rng: StdRng, max_distance_m: u32) -> Self {
        Self {
            rng,
            max_distance_m,
            last_timestamp: None,
        }
    }

    /// Draw a speed in km/h, uniform over whole meters per second.
    pub fn next_speed(&mut self) -> f64 {
        let meters = self.rng.gen_range(0..=self.max_distance_m);
        f64::from(meters) * MPS_TO_KMH
    }

    /// Produce the next sample for `trip_id`.
    ///
    /// Timestamps never go backwards within one sampler, even if the wall
    /// clock does.
    pub fn sample(&mut self, trip_id: &str) -> TelemetrySample {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(previous) if now < previous => previous,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        let speed = self.next_speed();
        TelemetrySample {
            trip_id: trip_id.to_string(),
            timestamp,
            speed,
            penalty_points: classify_penalty(speed),
        }
    }
}
