use std::sync::Arc;
use std::thread;

use fms_rust::{Action, CommandError, RpcClient};
use serde_json::json;

use crate::support;

#[test]
fn user_lifecycle() {
    let fleet = support::fleet();
    let client = &fleet.client;

    let created = client.create_user("", support::profile("alice"));
    assert_eq!(created, Ok(json!("User alice was created successfully!")));

    let user = client.read_user("alice").unwrap();
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["car"], "Skoda Octavia");
    assert!(user.get("password").is_none());

    let updated = client.update_user("alice", json!({ "car": "Tesla", "age": "31" })).unwrap();
    assert_eq!(updated["message"], "User alice was updated successfully!");
    let user = client.read_user("alice").unwrap();
    assert_eq!(user["car"], "Tesla");
    assert_eq!(user["age"], 31);

    assert_eq!(client.delete_user("alice"), Ok(json!("User alice was deleted!")));
    assert_eq!(
        client.read_user("alice"),
        Err(CommandError::NotFound("User alice not found!".into()))
    );

    let stats = fleet.stop();
    assert_eq!(stats.handled, 5);
    assert_eq!(stats.failed, 1);
}

#[test]
fn concurrent_callers_receive_their_own_replies() {
    let fleet = support::fleet();
    let client = Arc::new(RpcClient::connect(fleet.broker.clone(), &support::config()).unwrap());

    let callers: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            thread::spawn(move || {
                let name = format!("driver{i}");
                client.create_user("", support::profile(&name)).unwrap();
                let user = client.read_user(&name).unwrap();
                (name, user)
            })
        })
        .collect();

    for caller in callers {
        let (name, user) = caller.join().unwrap();
        assert_eq!(user["username"], name.as_str());
    }
    assert_eq!(client.pending_len(), 0);
    assert_eq!(fleet.store.user_count(), 16);
    fleet.stop();
}

#[test]
fn two_clients_share_one_dispatcher() {
    let fleet = support::fleet();
    let other = RpcClient::connect(fleet.broker.clone(), &support::config()).unwrap();
    assert_ne!(other.reply_queue(), fleet.client.reply_queue());

    fleet.client.create_user("", support::profile("alice")).unwrap();
    let user = other.read_user("alice").unwrap();
    assert_eq!(user["username"], "alice");

    other.shutdown();
    fleet.stop();
}

#[test]
fn generic_call_accepts_any_action() {
    let fleet = support::fleet();
    let created = fleet
        .client
        .call(Action::CreateUser, "bob", {
            let mut profile = support::profile("bob");
            profile.as_object_mut().unwrap().remove("username");
            profile
        })
        .unwrap();
    // the envelope actor stands in for a missing body username
    assert_eq!(created, json!("User bob was created successfully!"));
    fleet.stop();
}
