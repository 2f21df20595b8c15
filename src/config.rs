//! Runtime configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the shared work queue the original service consumed.
pub const DEFAULT_WORK_QUEUE: &str = "fm_actions_queue";

/// Floor for poll and tick intervals. A zero interval would turn the
/// listener, reply and generator loops into busy loops.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration shared by callers, the dispatcher and trip sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmsConfig {
    /// Durable queue commands are published to
    pub work_queue: String,

    /// How long a caller waits for a reply before giving up
    #[serde(with = "millis")]
    pub call_timeout: Duration,

    /// Poll interval of the caller's reply-subscription loop
    #[serde(with = "millis")]
    pub reply_poll_interval: Duration,

    /// Poll interval of the dispatcher's work-queue listener
    #[serde(with = "millis")]
    pub dispatch_poll_interval: Duration,

    /// Number of worker threads handling commands concurrently
    pub dispatch_workers: usize,

    /// Commands that may wait for a free worker before the listener stalls
    pub dispatch_backlog: usize,

    /// Interval between telemetry samples of an active trip
    #[serde(with = "millis")]
    pub trip_tick_interval: Duration,

    /// Upper bound on concurrently running trip generators
    pub max_active_trips: usize,

    /// Largest simulated distance covered in one second of driving, in meters
    pub max_distance_per_tick_m: u32,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for FmsConfig {
    fn default() -> Self {
        Self {
            work_queue: DEFAULT_WORK_QUEUE.to_string(),
            call_timeout: Duration::from_secs(5),
            reply_poll_interval: Duration::from_millis(50),
            dispatch_poll_interval: Duration::from_millis(50),
            dispatch_workers: 8,
            dispatch_backlog: 64,
            trip_tick_interval: Duration::from_secs(1),
            max_active_trips: 256,
            max_distance_per_tick_m: 30,
            log_filter: "info".to_string(),
            json_logs: false,
        }
    }
}

impl FmsConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FMS_WORK_QUEUE`: work queue name (default: fm_actions_queue)
    /// - `FMS_CALL_TIMEOUT_MS`: reply deadline (default: 5000)
    /// - `FMS_REPLY_POLL_MS`: reply loop poll interval (default: 50)
    /// - `FMS_DISPATCH_POLL_MS`: dispatcher poll interval (default: 50)
    /// - `FMS_DISPATCH_WORKERS`: handler threads (default: 8)
    /// - `FMS_DISPATCH_BACKLOG`: queued commands per pool (default: 64)
    /// - `FMS_TRIP_TICK_MS`: telemetry interval (default: 1000)
    /// - `FMS_MAX_ACTIVE_TRIPS`: concurrent trips (default: 256)
    /// - `FMS_MAX_DISTANCE_M`: max meters per simulated second (default: 30)
    /// - `FMS_LOG`: log filter (default: info)
    /// - `FMS_JSON_LOGS`: JSON log lines (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_queue: env::var("FMS_WORK_QUEUE").unwrap_or(defaults.work_queue),
            call_timeout: env_millis("FMS_CALL_TIMEOUT_MS", defaults.call_timeout),
            reply_poll_interval: env_interval("FMS_REPLY_POLL_MS", defaults.reply_poll_interval),
            dispatch_poll_interval: env_interval("FMS_DISPATCH_POLL_MS", defaults.dispatch_poll_interval),
            dispatch_workers: env_parse("FMS_DISPATCH_WORKERS", defaults.dispatch_workers),
            dispatch_backlog: env_parse("FMS_DISPATCH_BACKLOG", defaults.dispatch_backlog),
            trip_tick_interval: env_interval("FMS_TRIP_TICK_MS", defaults.trip_tick_interval),
            max_active_trips: env_parse("FMS_MAX_ACTIVE_TRIPS", defaults.max_active_trips),
            max_distance_per_tick_m: env_parse("FMS_MAX_DISTANCE_M", defaults.max_distance_per_tick_m),
            log_filter: env::var("FMS_LOG").unwrap_or(defaults.log_filter),
            json_logs: env_parse("FMS_JSON_LOGS", defaults.json_logs),
        }
    }

    /// Builder-style override of the reply deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Builder-style override of the telemetry interval.
    pub fn with_trip_tick_interval(mut self, interval: Duration) -> Self {
        self.trip_tick_interval = interval;
        self
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring invalid configuration value");
            default
        }),
        Err(_) => default,
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    let millis = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(env_parse(key, millis))
}

fn env_interval(key: &str, default: Duration) -> Duration {
    let interval = env_millis(key, default);
    if interval < MIN_INTERVAL {
        warn!(key, "interval must be at least 1ms, using default");
        return default;
    }
    interval
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
