//! End-to-end walk through one driver's day: register, drive, stop, read back.
//!
//! Run with `cargo run --example trip_demo`. Set `RUST_LOG=debug` to see
//! every telemetry tick.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fms_rust::{
    logging, Dispatcher, DispatcherThread, FmsConfig, InMemoryBroker, InMemoryRecordStore,
    RecordStore, RpcClient, SessionRegistry, TripSessionManager,
};
use serde_json::json;
use tracing::{error, info};

fn main() {
    let config = FmsConfig::from_env().with_trip_tick_interval(Duration::from_millis(200));
    logging::init(&config);

    if let Err(err) = run(&config) {
        error!(error = %err, "demo failed");
        std::process::exit(1);
    }
}

fn run(config: &FmsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let broker = InMemoryBroker::new();
    let store = Arc::new(InMemoryRecordStore::new());
    let trips = Arc::new(TripSessionManager::new(
        store.clone(),
        Arc::new(SessionRegistry::new()),
        config,
    ));

    let dispatcher = Arc::new(Dispatcher::standard(store.clone(), trips.clone()));
    let listener = DispatcherThread::spawn(dispatcher, broker.clone(), config)?;
    let client = RpcClient::connect(broker, config)?;

    let created = client.create_user(
        "",
        json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret",
            "age": 34,
            "car": "Skoda Octavia",
            "driving_exp": 12
        }),
    )?;
    info!(reply = %created, "create_user");

    let started = client.start_trip("alice", "commute", "home to work")?;
    info!(reply = %started, "start_trip");
    let trip_id = started["trip_id"].as_str().unwrap_or_default().to_string();

    thread::sleep(Duration::from_secs(2));

    let stopped = client.stop_trip("alice", &trip_id)?;
    info!(reply = %stopped, "stop_trip");

    for trip in store.trips_for("alice")? {
        let points: u32 = trip.telemetry.iter().map(|s| s.penalty_points).sum();
        info!(
            trip_id = %trip.trip_id,
            samples = trip.telemetry.len(),
            penalty_points = points,
            "trip summary"
        );
    }

    let profile = client.read_user("alice")?;
    info!(reply = %profile, "read_user");

    client.shutdown();
    trips.shutdown();
    let stats = listener.stop();
    info!(handled = stats.handled, failed = stats.failed, "dispatcher stopped");
    Ok(())
}
