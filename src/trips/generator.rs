//! Per-trip telemetry loop.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, info_span};

use super::{SessionRegistry, TelemetrySampler, TripSession, TripState};
use crate::store::RecordStore;

/// What a generator did before it exited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripReport {
    pub trip_id: String,
    /// Samples appended to the trip record
    pub samples: u64,
    /// Set when the loop ended because of an error rather than a stop
    pub failure: Option<String>,
}

/// Run the telemetry loop of one session until it is stopped or fails.
///
/// Each tick waits on the session's condvar, so a stop request wakes the
/// loop at once. The state check and the append happen under the session
/// lock: once `request_stop` has returned, no further sample is written.
pub(crate) fn run<S: RecordStore>(
    session: Arc<TripSession>,
    store: Arc<S>,
    registry: Arc<SessionRegistry>,
    tick: Duration,
    mut sampler: TelemetrySampler,
) -> TripReport {
    let span = info_span!("trip", trip_id = %session.trip_id(), owner = %session.owner());
    let _entered = span.enter();

    let mut report = TripReport {
        trip_id: session.trip_id().to_string(),
        ..TripReport::default()
    };
    info!("telemetry started");

    loop {
        let guard = session.lock();
        let (mut inner, _) = session
            .condvar()
            .wait_timeout_while(guard, tick, |inner| inner.state == TripState::Running)
            .unwrap_or_else(PoisonError::into_inner);

        if inner.state != TripState::Running {
            inner.state = TripState::Stopped;
            break;
        }

        let Some(handle) = inner.handle.clone() else {
            report.failure = Some("running session has no trip record".to_string());
            inner.state = TripState::Stopped;
            break;
        };

        let sample = sampler.sample(session.trip_id());
        debug!(speed = sample.speed, penalty_points = sample.penalty_points, "tick");

        if let Err(err) = store.append_telemetry(&handle, sample) {
            error!(error = %err, "telemetry append failed, ending trip");
            report.failure = Some(err.to_string());
            inner.state = TripState::Stopped;
            break;
        }
        inner.samples += 1;
        report.samples += 1;
    }

    session.condvar().notify_all();
    registry.release(&session);
    info!(samples = report.samples, "telemetry stopped");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use crate::store::{InMemoryRecordStore, NewTrip, NewUser};

    fn fixture() -> (Arc<InMemoryRecordStore>, Arc<SessionRegistry>, Arc<TripSession>) {
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .create_user(NewUser {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password: "secret".into(),
                age: 34,
                car: "Skoda".into(),
                driving_exp: 12,
            })
            .unwrap();
        let handle = store
            .create_trip(NewTrip {
                trip_id: "t-1".into(),
                owner: "alice".into(),
                title: "commute".into(),
                content: String::new(),
            })
            .unwrap();

        let registry = Arc::new(SessionRegistry::new());
        let session = Arc::new(TripSession::new("t-1", "alice", "commute", ""));
        registry.reserve(session.clone(), 10).unwrap();
        assert!(session.mark_running(handle));
        (store, registry, session)
    }

    #[test]
    fn stops_on_request_and_leaves_registry() {
        let (store, registry, session) = fixture();
        let worker = {
            let (store, registry, session) = (store.clone(), registry.clone(), session.clone());
            thread::spawn(move || {
                run(session, store, registry, Duration::from_millis(5), TelemetrySampler::seeded(30, 1))
            })
        };

        thread::sleep(Duration::from_millis(60));
        session.request_stop();
        let report = worker.join().unwrap();

        assert_eq!(report.failure, None);
        assert!(report.samples > 0);
        assert_eq!(session.state(), TripState::Stopped);
        assert!(registry.get("t-1").is_none());

        let trip = store.get_trip(&session.handle().unwrap()).unwrap();
        assert_eq!(trip.telemetry.len() as u64, report.samples);
    }

    #[test]
    fn store_failure_ends_only_this_loop() {
        let (store, registry, session) = fixture();
        store.delete_user("alice").unwrap();

        let report = run(
            session.clone(),
            store,
            registry.clone(),
            Duration::from_millis(1),
            TelemetrySampler::seeded(30, 1),
        );

        assert_eq!(report.samples, 0);
        assert_eq!(report.failure.as_deref(), Some("User alice not found!"));
        assert_eq!(session.state(), TripState::Stopped);
        assert!(registry.is_empty());
    }
}
