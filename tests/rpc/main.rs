//! Request/response integration tests: RpcClient ⇄ broker ⇄ DispatcherThread.

#[path = "../support/mod.rs"]
mod support;

mod failures;
mod redelivery;
mod round_trip;
