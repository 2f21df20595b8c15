use std::sync::Arc;

use fms_rust::{CommandError, InMemoryBroker, InMemoryRecordStore, RecordStore};
use serde_json::json;

use crate::support::{self, FlakyReplies};

#[test]
fn lost_reply_requeues_the_command() {
    let broker = InMemoryBroker::new();
    let store = Arc::new(InMemoryRecordStore::new());
    let fleet = support::fleet_on(
        broker.clone(),
        FlakyReplies::new(broker, 1),
        store,
        &support::config(),
    );
    fleet.store.create_user(serde_json::from_value(support::profile("alice")).unwrap()).unwrap();

    // first reply is lost, the redelivered command answers the call
    let user = fleet.client.read_user("alice").unwrap();
    assert_eq!(user["username"], "alice");

    let stats = fleet.stop();
    assert_eq!(stats.reply_failures, 1);
    assert_eq!(stats.handled, 2);
}

#[test]
fn redelivered_create_surfaces_duplicate() {
    let broker = InMemoryBroker::new();
    let fleet = support::fleet_on(
        broker.clone(),
        FlakyReplies::new(broker, 1),
        Arc::new(InMemoryRecordStore::new()),
        &support::config(),
    );

    // the user is created on the first delivery; its reply is lost
    let result = fleet.client.create_user("", support::profile("alice"));
    assert!(matches!(result, Err(CommandError::Validation(msg)) if msg.contains("already taken")));
    assert_eq!(fleet.store.user_count(), 1);

    assert_eq!(
        fleet.client.read_user("alice").map(|user| user["email"].clone()),
        Ok(json!("alice@example.com"))
    );
    fleet.stop();
}
