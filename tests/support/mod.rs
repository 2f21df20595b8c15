//! Shared wiring for the integration suites: an in-memory broker, store,
//! dispatcher and client connected the way a deployment would be.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fms_rust::bus::{Delivery, Listener, Message, QueueOptions, Sender, Topology};
use fms_rust::store::{
    NewTrip, NewUser, TelemetrySample, TripHandle, TripRecord, UserPatch, UserRecord,
};
use fms_rust::{
    DispatchStats, Dispatcher, DispatcherThread, FmsConfig, InMemoryBroker, InMemoryRecordStore,
    RecordStore, RpcClient, SessionRegistry, StoreError, TransportError, TripSessionManager,
};
use serde_json::{json, Value};

pub fn config() -> FmsConfig {
    FmsConfig {
        reply_poll_interval: Duration::from_millis(5),
        dispatch_poll_interval: Duration::from_millis(5),
        dispatch_workers: 4,
        ..FmsConfig::default()
    }
    .with_call_timeout(Duration::from_secs(2))
    .with_trip_tick_interval(Duration::from_millis(10))
}

/// Everything needed to issue commands end to end.
pub struct Fleet<S: RecordStore = InMemoryRecordStore> {
    pub broker: InMemoryBroker,
    pub store: Arc<S>,
    pub trips: Arc<TripSessionManager<S>>,
    pub client: RpcClient<InMemoryBroker>,
    listener: Option<DispatcherThread>,
}

pub fn fleet() -> Fleet {
    fleet_with(config())
}

pub fn fleet_with(config: FmsConfig) -> Fleet {
    let broker = InMemoryBroker::new();
    fleet_on(broker.clone(), broker, Arc::new(InMemoryRecordStore::new()), &config)
}

/// Wire a fleet whose dispatcher talks to `dispatch_broker`, which may wrap
/// `broker` to inject faults.
pub fn fleet_on<S, B>(broker: InMemoryBroker, dispatch_broker: B, store: Arc<S>, config: &FmsConfig) -> Fleet<S>
where
    S: RecordStore,
    B: fms_rust::Broker,
{
    let trips = Arc::new(TripSessionManager::new(
        store.clone(),
        Arc::new(SessionRegistry::new()),
        config,
    ));
    let dispatcher = Arc::new(Dispatcher::standard(store.clone(), trips.clone()));
    let listener = DispatcherThread::spawn(dispatcher, dispatch_broker, config).unwrap();
    let client = RpcClient::connect(broker.clone(), config).unwrap();

    Fleet {
        broker,
        store,
        trips,
        client,
        listener: Some(listener),
    }
}

impl<S: RecordStore> Fleet<S> {
    /// Stop the dispatcher and every trip generator.
    pub fn stop(mut self) -> DispatchStats {
        self.trips.shutdown();
        self.listener
            .take()
            .map(DispatcherThread::stop)
            .unwrap_or_default()
    }
}

pub fn profile(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "secret",
        "age": 30,
        "car": "Skoda Octavia",
        "driving_exp": 8
    })
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Broker whose first `failures` sends to reply queues fail.
#[derive(Clone)]
pub struct FlakyReplies {
    inner: InMemoryBroker,
    failures: Arc<AtomicUsize>,
}

impl FlakyReplies {
    pub fn new(inner: InMemoryBroker, failures: usize) -> Self {
        Self {
            inner,
            failures: Arc::new(AtomicUsize::new(failures)),
        }
    }
}

impl Sender for FlakyReplies {
    fn send(&self, queue: &str, message: Message) -> Result<(), TransportError> {
        let is_reply = queue.starts_with("amq.gen-");
        let fail = is_reply
            && self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if fail {
            return Err(TransportError::Closed("channel reset".into()));
        }
        self.inner.send(queue, message)
    }
}

impl Listener for FlakyReplies {
    fn listen(&self, queue: &str, timeout: Duration) -> Result<Option<Delivery>, TransportError> {
        self.inner.listen(queue, timeout)
    }

    fn ack(&self, queue: &str, tag: u64) -> Result<(), TransportError> {
        self.inner.ack(queue, tag)
    }

    fn nack(&self, queue: &str, tag: u64, requeue: bool) -> Result<(), TransportError> {
        self.inner.nack(queue, tag, requeue)
    }
}

impl Topology for FlakyReplies {
    fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), TransportError> {
        self.inner.declare_queue(name, options)
    }

    fn declare_reply_queue(&self) -> Result<String, TransportError> {
        self.inner.declare_reply_queue()
    }

    fn delete_queue(&self, name: &str) -> Result<(), TransportError> {
        self.inner.delete_queue(name)
    }
}

/// Record store whose backend is down.
pub struct DownStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".into()))
}

impl RecordStore for DownStore {
    fn create_user(&self, _user: NewUser) -> Result<UserRecord, StoreError> {
        down()
    }

    fn get_user(&self, _username: &str) -> Result<UserRecord, StoreError> {
        down()
    }

    fn update_user(&self, _username: &str, _patch: UserPatch) -> Result<UserRecord, StoreError> {
        down()
    }

    fn delete_user(&self, _username: &str) -> Result<(), StoreError> {
        down()
    }

    fn create_trip(&self, _trip: NewTrip) -> Result<TripHandle, StoreError> {
        down()
    }

    fn append_telemetry(&self, _trip: &TripHandle, _sample: TelemetrySample) -> Result<(), StoreError> {
        down()
    }

    fn get_trip(&self, _trip: &TripHandle) -> Result<TripRecord, StoreError> {
        down()
    }

    fn trips_for(&self, _owner: &str) -> Result<Vec<TripRecord>, StoreError> {
        down()
    }
}
