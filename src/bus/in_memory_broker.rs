//! In-memory broker for testing and single-process deployments.
//!
//! Provides named queues with at-least-once delivery: a listened message
//! stays in the queue's unacked set until it is acked, and a nack with
//! requeue puts it back at the head of the queue.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, trace};
use uuid::Uuid;

use super::{Delivery, Listener, Message, QueueOptions, Sender, Topology, TransportError};

struct QueueState {
    options: QueueOptions,
    ready: VecDeque<(Message, bool)>,
    unacked: HashMap<u64, Message>,
}

impl QueueState {
    fn new(options: QueueOptions) -> Self {
        Self {
            options,
            ready: VecDeque::new(),
            unacked: HashMap::new(),
        }
    }
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, QueueState>,
    next_tag: u64,
}

struct Inner {
    state: Mutex<BrokerState>,
    available: Condvar,
}

/// In-memory broker shared across threads via `Clone`.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use fms_rust::bus::{InMemoryBroker, Listener, Message, QueueOptions, Sender, Topology};
///
/// let broker = InMemoryBroker::new();
/// broker.declare_queue("work", QueueOptions::durable()).unwrap();
/// broker.send("work", Message::with_string_payload("msg-1", "{}")).unwrap();
///
/// let delivery = broker.listen("work", Duration::from_millis(10)).unwrap().unwrap();
/// assert_eq!(delivery.message.id, "msg-1");
/// broker.ack("work", delivery.tag).unwrap();
/// ```
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(BrokerState::default()),
                available: Condvar::new(),
            }),
        }
    }

    fn state(&self, operation: &'static str) -> Result<MutexGuard<'_, BrokerState>, TransportError> {
        self.inner
            .state
            .lock()
            .map_err(|_| TransportError::Poisoned(operation))
    }

    /// Check whether a queue is declared.
    pub fn queue_exists(&self, name: &str) -> bool {
        self.state("queue_exists")
            .map(|state| state.queues.contains_key(name))
            .unwrap_or(false)
    }

    /// Number of messages waiting to be delivered on a queue.
    pub fn ready_count(&self, name: &str) -> usize {
        self.state("ready_count")
            .ok()
            .and_then(|state| state.queues.get(name).map(|q| q.ready.len()))
            .unwrap_or(0)
    }

    /// Number of messages delivered but not yet settled on a queue.
    pub fn unacked_count(&self, name: &str) -> usize {
        self.state("unacked_count")
            .ok()
            .and_then(|state| state.queues.get(name).map(|q| q.unacked.len()))
            .unwrap_or(0)
    }

    /// Options a queue was declared with.
    pub fn queue_options(&self, name: &str) -> Option<QueueOptions> {
        self.state("queue_options")
            .ok()
            .and_then(|state| state.queues.get(name).map(|q| q.options))
    }
}

impl Sender for InMemoryBroker {
    fn send(&self, queue: &str, message: Message) -> Result<(), TransportError> {
        let mut state = self.state("send")?;
        let target = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::Unroutable(queue.to_string()))?;
        trace!(queue, message_id = %message.id, "enqueue");
        target.ready.push_back((message, false));
        drop(state);
        self.inner.available.notify_all();
        Ok(())
    }
}

impl Listener for InMemoryBroker {
    fn listen(&self, queue: &str, timeout: Duration) -> Result<Option<Delivery>, TransportError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state("listen")?;

        loop {
            let BrokerState { queues, next_tag } = &mut *state;
            let target = queues
                .get_mut(queue)
                .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

            if let Some((message, redelivered)) = target.ready.pop_front() {
                *next_tag += 1;
                let tag = *next_tag;
                target.unacked.insert(tag, message.clone());
                return Ok(Some(Delivery {
                    tag,
                    redelivered,
                    message,
                }));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            state = self
                .inner
                .available
                .wait_timeout(state, deadline - now)
                .map_err(|_| TransportError::Poisoned("listen"))?
                .0;
        }
    }

    fn ack(&self, queue: &str, tag: u64) -> Result<(), TransportError> {
        let mut state = self.state("ack")?;
        let target = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;
        if target.unacked.remove(&tag).is_none() {
            debug!(queue, tag, "ack for unknown delivery tag");
        }
        Ok(())
    }

    fn nack(&self, queue: &str, tag: u64, requeue: bool) -> Result<(), TransportError> {
        let mut state = self.state("nack")?;
        let target = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;
        match target.unacked.remove(&tag) {
            Some(message) if requeue => {
                target.ready.push_front((message, true));
                drop(state);
                self.inner.available.notify_all();
            }
            Some(_) => {}
            None => debug!(queue, tag, "nack for unknown delivery tag"),
        }
        Ok(())
    }
}

impl Topology for InMemoryBroker {
    fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), TransportError> {
        let mut state = self.state("declare_queue")?;
        state
            .queues
            .entry(name.to_string())
            .or_insert_with(|| QueueState::new(options));
        Ok(())
    }

    fn declare_reply_queue(&self) -> Result<String, TransportError> {
        let name = format!("amq.gen-{}", Uuid::new_v4().simple());
        self.declare_queue(&name, QueueOptions::ephemeral())?;
        Ok(name)
    }

    fn delete_queue(&self, name: &str) -> Result<(), TransportError> {
        let mut state = self.state("delete_queue")?;
        if let Some(queue) = state.queues.remove(name) {
            debug!(
                queue = name,
                dropped = queue.ready.len() + queue.unacked.len(),
                "queue deleted"
            );
        }
        drop(state);
        // Wake listeners so they notice the queue is gone.
        self.inner.available.notify_all();
        Ok(())
    }
}
