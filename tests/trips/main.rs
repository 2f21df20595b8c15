//! Trip session integration tests: start/stop over the queue, generator
//! lifecycle, isolation between concurrent trips.

#[path = "../support/mod.rs"]
mod support;

mod isolation;
mod lifecycle;
