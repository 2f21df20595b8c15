use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::PendingCalls;
use crate::bus::{Broker, QueueOptions, TransportError};
use crate::config::{FmsConfig, MIN_INTERVAL};
use crate::error::CommandError;
use crate::protocol::{decode_reply, payload_from, Action, CommandEnvelope, CommandResult};

/// Request/response caller over the work queue.
///
/// One client owns one reply queue and one reply thread, and is shared by
/// any number of calling threads. Each call blocks only its own thread.
pub struct RpcClient<B: Broker> {
    broker: B,
    work_queue: String,
    reply_queue: String,
    call_timeout: Duration,
    pending: Arc<PendingCalls>,
    stop_tx: mpsc::Sender<()>,
    reply_loop: Option<JoinHandle<()>>,
}

impl<B: Broker> RpcClient<B> {
    /// Declare the work queue and a private reply queue, then start
    /// listening for replies.
    pub fn connect(broker: B, config: &FmsConfig) -> Result<Self, TransportError> {
        broker.declare_queue(&config.work_queue, QueueOptions::durable())?;
        let reply_queue = broker.declare_reply_queue()?;

        let pending = Arc::new(PendingCalls::new());
        let (stop_tx, stop_rx) = mpsc::channel();

        let reply_loop = {
            let (broker, queue, pending) = (broker.clone(), reply_queue.clone(), pending.clone());
            let poll = config.reply_poll_interval.max(MIN_INTERVAL);
            thread::Builder::new()
                .name("rpc-replies".to_string())
                .spawn(move || run_reply_loop(&broker, &queue, &pending, poll, &stop_rx))
                .map_err(|e| TransportError::Closed(format!("failed to start reply loop: {e}")))?
        };

        info!(work_queue = %config.work_queue, reply_queue = %reply_queue, "rpc client connected");
        Ok(Self {
            broker,
            work_queue: config.work_queue.clone(),
            reply_queue,
            call_timeout: config.call_timeout,
            pending,
            stop_tx,
            reply_loop: Some(reply_loop),
        })
    }

    /// Issue a command and wait for its reply.
    pub fn call(&self, action: Action, actor: &str, payload: Value) -> CommandResult {
        let payload = payload_from(payload)?;
        self.call_envelope(CommandEnvelope::new(action, actor, payload))
    }

    /// Issue a pre-built envelope. Its correlation id and reply queue are
    /// replaced with this client's.
    pub fn call_envelope(&self, mut envelope: CommandEnvelope) -> CommandResult {
        let correlation_id = Uuid::new_v4().to_string();
        envelope.correlation_id = Some(correlation_id.clone());
        envelope.reply_to = Some(self.reply_queue.clone());

        let span = info_span!("call", action = %envelope.action, correlation_id = %correlation_id);
        let _entered = span.enter();

        let completion = self.pending.register(&correlation_id);
        let result = self.publish(&envelope).and_then(|()| self.await_reply(&completion));
        self.pending.remove(&correlation_id);

        if let Err(err) = &result {
            debug!(error = %err, "call failed");
        }
        result
    }

    pub fn create_user(&self, username: &str, profile: Value) -> CommandResult {
        self.call(Action::CreateUser, username, profile)
    }

    pub fn read_user(&self, username: &str) -> CommandResult {
        self.call(Action::ReadUser, username, Value::Null)
    }

    pub fn update_user(&self, username: &str, changes: Value) -> CommandResult {
        self.call(Action::UpdateUser, username, changes)
    }

    pub fn delete_user(&self, username: &str) -> CommandResult {
        self.call(Action::DeleteUser, username, Value::Null)
    }

    pub fn start_trip(&self, username: &str, title: &str, content: &str) -> CommandResult {
        self.call(Action::StartTrip, username, json!({ "title": title, "content": content }))
    }

    pub fn stop_trip(&self, username: &str, trip_id: &str) -> CommandResult {
        self.call(Action::StopTrip, username, json!({ "trip_id": trip_id }))
    }

    pub fn reply_queue(&self) -> &str {
        &self.reply_queue
    }

    /// Calls currently waiting for a reply.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Stop the reply thread and delete the reply queue.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn publish(&self, envelope: &CommandEnvelope) -> Result<(), CommandError> {
        let message = envelope.to_message()?;
        self.broker.send(&self.work_queue, message)?;
        Ok(())
    }

    fn await_reply(&self, completion: &Receiver<CommandResult>) -> CommandResult {
        match completion.recv_timeout(self.call_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(waited_ms = self.call_timeout.as_millis() as u64, "call timed out");
                Err(CommandError::Timeout {
                    waited_ms: self.call_timeout.as_millis() as u64,
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(CommandError::Transport("reply channel closed".to_string()))
            }
        }
    }

    fn close(&mut self) {
        let Some(reply_loop) = self.reply_loop.take() else {
            return;
        };
        let _ = self.stop_tx.send(());
        let _ = reply_loop.join();
        if let Err(err) = self.broker.delete_queue(&self.reply_queue) {
            warn!(reply_queue = %self.reply_queue, error = %err, "failed to delete reply queue");
        }
        debug!(reply_queue = %self.reply_queue, "rpc client closed");
    }
}

impl<B: Broker> Drop for RpcClient<B> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Route replies to their pending calls until stopped.
fn run_reply_loop<B: Broker>(
    broker: &B,
    queue: &str,
    pending: &PendingCalls,
    poll: Duration,
    stop_rx: &Receiver<()>,
) {
    loop {
        match stop_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match broker.listen(queue, poll) {
            Ok(Some(delivery)) => {
                let message = &delivery.message;
                match message.correlation_id.as_deref() {
                    Some(id) => {
                        if !pending.complete(id, decode_reply(message)) {
                            debug!(correlation_id = id, "discarding reply for unknown call");
                        }
                    }
                    None => debug!("discarding reply without correlation id"),
                }
                if let Err(err) = broker.ack(queue, delivery.tag) {
                    warn!(error = %err, "failed to ack reply");
                }
            }
            Ok(None) => {}
            Err(TransportError::QueueNotFound(_)) => {
                warn!(reply_queue = queue, "reply queue is gone, stopping reply loop");
                break;
            }
            Err(err) => {
                warn!(reply_queue = queue, error = %err, "reply listen failed");
                thread::sleep(poll);
            }
        }
    }
}
