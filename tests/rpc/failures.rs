use std::sync::Arc;
use std::time::Duration;

use fms_rust::bus::{Listener, Message, Sender, Topology};
use fms_rust::protocol::decode_reply;
use fms_rust::{CommandError, FmsConfig, InMemoryBroker, RpcClient};
use serde_json::json;

use crate::support;

#[test]
fn call_without_dispatcher_times_out() {
    let broker = InMemoryBroker::new();
    let config = support::config().with_call_timeout(Duration::from_millis(150));
    let client = RpcClient::connect(broker.clone(), &config).unwrap();

    let started = std::time::Instant::now();
    let result = client.read_user("alice");

    assert_eq!(result, Err(CommandError::Timeout { waited_ms: 150 }));
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert_eq!(client.pending_len(), 0);
}

#[test]
fn late_reply_after_timeout_is_ignored() {
    let broker = InMemoryBroker::new();
    let config = support::config().with_call_timeout(Duration::from_millis(50));
    let client = RpcClient::connect(broker.clone(), &config).unwrap();

    assert!(matches!(client.read_user("alice"), Err(CommandError::Timeout { .. })));

    // a dispatcher coming up late answers the stale command
    let fleet = support::fleet_on(
        broker.clone(),
        broker.clone(),
        Arc::new(fms_rust::InMemoryRecordStore::new()),
        &support::config(),
    );
    assert!(support::wait_until(Duration::from_secs(2), || {
        broker.ready_count(client.reply_queue()) == 0
            && broker.unacked_count(client.reply_queue()) == 0
            && broker.ready_count(&config.work_queue) == 0
    }));

    assert_eq!(client.pending_len(), 0);
    fleet.stop();
}

#[test]
fn unknown_action_gets_an_error_reply() {
    let fleet = support::fleet();
    let reply_queue = fleet.broker.declare_reply_queue().unwrap();

    let command = Message::with_string_payload(
        "m-1",
        r#"{"action":"fly_to_the_moon","username":"alice","body":{}}"#,
    )
    .with_correlation_id("c-1")
    .with_reply_to(&reply_queue);
    fleet.broker.send(&FmsConfig::default().work_queue, command).unwrap();

    let reply = fleet
        .broker
        .listen(&reply_queue, Duration::from_secs(2))
        .unwrap()
        .expect("reply");
    assert_eq!(reply.message.correlation_id.as_deref(), Some("c-1"));
    assert_eq!(
        decode_reply(&reply.message),
        Err(CommandError::UnknownAction("fly_to_the_moon".into()))
    );

    let stats = fleet.stop();
    assert_eq!(stats.failed, 1);
}

#[test]
fn duplicate_user_is_a_validation_error() {
    let fleet = support::fleet();
    fleet.client.create_user("", support::profile("alice")).unwrap();

    let again = fleet.client.create_user("", support::profile("alice"));
    assert!(matches!(again, Err(CommandError::Validation(msg)) if msg.contains("alice")));

    let mut same_email = support::profile("alice2");
    same_email["email"] = json!("alice@example.com");
    let clash = fleet.client.create_user("", same_email);
    assert!(matches!(clash, Err(CommandError::Validation(msg)) if msg.contains("email")));

    assert_eq!(fleet.store.user_count(), 1);
    fleet.stop();
}

#[test]
fn store_outage_is_reported_not_hung() {
    let broker = InMemoryBroker::new();
    let fleet = support::fleet_on(broker.clone(), broker, Arc::new(support::DownStore), &support::config());

    let result = fleet.client.read_user("alice");
    assert!(matches!(result, Err(CommandError::StoreUnavailable(_))));

    let result = fleet.client.start_trip("alice", "commute", "");
    assert!(matches!(result, Err(CommandError::StoreUnavailable(_))));
    assert!(fleet.trips.active_trips().is_empty());
    fleet.stop();
}

#[test]
fn missing_required_fields_are_rejected() {
    let fleet = support::fleet();
    let result = fleet.client.create_user("carol", json!({ "email": "carol@example.com" }));
    assert!(matches!(result, Err(CommandError::Validation(_))));

    let result = fleet.client.update_user("carol", json!("not an object"));
    assert!(matches!(result, Err(CommandError::Validation(_))));
    fleet.stop();
}
