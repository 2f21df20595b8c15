use std::thread;
use std::time::Duration;

use fms_rust::trips::classify_penalty;
use fms_rust::{Action, CommandError, RecordStore, TripState};
use serde_json::json;

use crate::support;

fn samples(fleet: &support::Fleet, owner: &str) -> usize {
    fleet
        .store
        .trips_for(owner)
        .unwrap()
        .iter()
        .map(|trip| trip.telemetry.len())
        .sum()
}

#[test]
fn start_tick_stop_over_the_queue() {
    let fleet = support::fleet();
    fleet.client.create_user("", support::profile("alice")).unwrap();

    let started = fleet.client.start_trip("alice", "commute", "home to work").unwrap();
    assert_eq!(started["message"], "User alice has started trip!");
    let trip_id = started["trip_id"].as_str().unwrap().to_string();
    assert_eq!(fleet.trips.state(&trip_id), Some(TripState::Running));

    assert!(support::wait_until(Duration::from_secs(2), || samples(&fleet, "alice") >= 3));

    let stopped = fleet.client.stop_trip("alice", &trip_id).unwrap();
    assert_eq!(stopped["message"], "User alice has stopped trip!");

    // nothing is appended once the stop has been acknowledged
    let at_stop = samples(&fleet, "alice");
    thread::sleep(Duration::from_millis(60));
    assert_eq!(samples(&fleet, "alice"), at_stop);
    assert!(support::wait_until(Duration::from_secs(2), || fleet.trips.active_trips().is_empty()));

    let trip = &fleet.store.trips_for("alice").unwrap()[0];
    assert_eq!(trip.title, "commute");
    assert_eq!(trip.trip_id, trip_id);
    for pair in trip.telemetry.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    for sample in &trip.telemetry {
        assert!((0.0..=108.001).contains(&sample.speed));
        assert_eq!(sample.penalty_points, classify_penalty(sample.speed));
    }
    fleet.stop();
}

#[test]
fn duplicate_start_is_already_running() {
    let fleet = support::fleet();
    fleet.client.create_user("", support::profile("alice")).unwrap();

    let start = json!({ "title": "commute", "trip_id": "t-1" });
    fleet.client.call(Action::StartTrip, "alice", start.clone()).unwrap();
    let again = fleet.client.call(Action::StartTrip, "alice", start);

    assert_eq!(again, Err(CommandError::AlreadyRunning("t-1".into())));
    assert_eq!(fleet.store.trips_for("alice").unwrap().len(), 1);
    assert_eq!(fleet.trips.active_trips(), vec!["t-1".to_string()]);
    fleet.stop();
}

#[test]
fn stopping_twice_is_harmless() {
    let fleet = support::fleet();
    fleet.client.create_user("", support::profile("alice")).unwrap();
    fleet
        .client
        .call(Action::StartTrip, "alice", json!({ "title": "commute", "trip_id": "t-1" }))
        .unwrap();

    fleet.client.stop_trip("alice", "t-1").unwrap();
    let second = fleet.client.stop_trip("alice", "t-1");
    // either still winding down or already gone
    assert!(matches!(second, Ok(_) | Err(CommandError::NotFound(_))));
    fleet.stop();
}

#[test]
fn unknown_owner_cannot_start() {
    let fleet = support::fleet();
    let result = fleet.client.start_trip("ghost", "commute", "");
    assert_eq!(result, Err(CommandError::NotFound("User ghost not found!".into())));
    assert!(fleet.trips.active_trips().is_empty());
    fleet.stop();
}

#[test]
fn deleting_the_owner_ends_the_trip() {
    let fleet = support::fleet();
    fleet.client.create_user("", support::profile("alice")).unwrap();
    fleet
        .client
        .call(Action::StartTrip, "alice", json!({ "title": "commute", "trip_id": "t-1" }))
        .unwrap();

    fleet.client.delete_user("alice").unwrap();
    assert!(support::wait_until(Duration::from_secs(2), || fleet.trips.active_trips().is_empty()));
    fleet.stop();
}

#[test]
fn capacity_limit_rejects_extra_trips() {
    let config = support::config();
    let fleet = support::fleet_with(fms_rust::FmsConfig {
        max_active_trips: 1,
        ..config
    });
    fleet.client.create_user("", support::profile("alice")).unwrap();
    fleet.client.start_trip("alice", "one", "").unwrap();

    let second = fleet.client.start_trip("alice", "two", "");
    assert!(matches!(second, Err(CommandError::CapacityExceeded(_))));
    assert_eq!(fleet.trips.active_trips().len(), 1);
    fleet.stop();
}
