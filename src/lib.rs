pub mod bus;
pub mod config;
pub mod dispatch;
mod error;
pub mod handlers;
pub mod logging;
pub mod protocol;
pub mod rpc;
pub mod store;
pub mod trips;

pub use bus::{Broker, InMemoryBroker, Message, TransportError};
pub use config::FmsConfig;
pub use dispatch::{Context, DispatchStats, Dispatcher, DispatcherThread};
pub use error::CommandError;
pub use protocol::{Action, CommandEnvelope, CommandResult};
pub use rpc::RpcClient;
pub use store::{InMemoryRecordStore, RecordStore, StoreError};
pub use trips::{SessionRegistry, TripSessionManager, TripState};
