use std::time::Duration;

use fms_rust::{Action, RecordStore};
use serde_json::json;

use crate::support;

#[test]
fn concurrent_trips_do_not_mix_telemetry() {
    let fleet = support::fleet();
    for name in ["alice", "bob"] {
        fleet.client.create_user("", support::profile(name)).unwrap();
    }

    fleet
        .client
        .call(Action::StartTrip, "alice", json!({ "title": "a", "trip_id": "trip-a" }))
        .unwrap();
    fleet
        .client
        .call(Action::StartTrip, "bob", json!({ "title": "b", "trip_id": "trip-b" }))
        .unwrap();

    let has_samples = |owner: &str| {
        fleet
            .store
            .trips_for(owner)
            .map(|trips| trips.iter().all(|t| t.telemetry.len() >= 3))
            .unwrap_or(false)
    };
    assert!(support::wait_until(Duration::from_secs(2), || {
        has_samples("alice") && has_samples("bob")
    }));

    // stopping one trip leaves the other running
    fleet.client.stop_trip("alice", "trip-a").unwrap();
    assert!(support::wait_until(Duration::from_secs(2), || {
        fleet.trips.active_trips() == vec!["trip-b".to_string()]
    }));

    for (owner, trip_id) in [("alice", "trip-a"), ("bob", "trip-b")] {
        let trips = fleet.store.trips_for(owner).unwrap();
        assert_eq!(trips.len(), 1);
        assert!(trips[0].telemetry.iter().all(|s| s.trip_id == trip_id));
    }

    let reports = fleet.trips.shutdown();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].trip_id, "trip-b");
    fleet.stop();
}
