use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, info_span, warn};

use super::{Dispatcher, WorkerPool};
use crate::bus::{Broker, Delivery, QueueOptions, TransportError};
use crate::config::{FmsConfig, MIN_INTERVAL};
use crate::error::CommandError;
use crate::protocol::{encode_reply, CommandEnvelope, CommandResult};
use crate::store::RecordStore;

/// Statistics from a dispatcher thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands whose handler returned `Ok`.
    pub handled: usize,
    /// Commands that ended in an error reply (decode, validation, panic...).
    pub failed: usize,
    /// Replies that could not be published; their commands were requeued.
    pub reply_failures: usize,
    /// Number of poll cycles completed.
    pub polls: usize,
}

#[derive(Default)]
struct Counters {
    handled: AtomicUsize,
    failed: AtomicUsize,
    reply_failures: AtomicUsize,
    polls: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            handled: self.handled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            reply_failures: self.reply_failures.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
        }
    }
}

/// Handle to the background thread consuming the work queue.
/// Drop or call `stop()` to shut down.
pub struct DispatcherThread {
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl DispatcherThread {
    /// Declare the work queue and start consuming it.
    ///
    /// The listener thread only pulls deliveries; decoding, handling and
    /// replying run on a pool of `dispatch_workers` threads so slow
    /// commands do not hold up the rest of the queue.
    pub fn spawn<S, B>(
        dispatcher: Arc<Dispatcher<S>>,
        broker: B,
        config: &FmsConfig,
    ) -> Result<Self, TransportError>
    where
        S: RecordStore,
        B: Broker,
    {
        let queue = config.work_queue.clone();
        broker.declare_queue(&queue, QueueOptions::durable())?;

        let pool = WorkerPool::new("dispatch", config.dispatch_workers, config.dispatch_backlog)
            .map_err(|e| TransportError::Closed(format!("failed to start dispatch workers: {e}")))?;

        let poll_interval = config.dispatch_poll_interval.max(MIN_INTERVAL);
        let counters = Arc::new(Counters::default());
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = {
            let counters = counters.clone();
            thread::Builder::new()
                .name("dispatch-listener".to_string())
                .spawn(move || {
                    info!(queue = %queue, workers = pool.size(), "dispatcher listening");
                    loop {
                        match stop_rx.try_recv() {
                            Ok(()) | Err(TryRecvError::Disconnected) => break,
                            Err(TryRecvError::Empty) => {}
                        }

                        counters.polls.fetch_add(1, Ordering::Relaxed);

                        match broker.listen(&queue, poll_interval) {
                            Ok(Some(delivery)) => {
                                let tag = delivery.tag;
                                let job = {
                                    let (dispatcher, broker, queue, counters) =
                                        (dispatcher.clone(), broker.clone(), queue.clone(), counters.clone());
                                    move || process(&dispatcher, &broker, &queue, delivery, &counters)
                                };
                                if pool.execute(job).is_err() {
                                    error!("worker pool closed, returning delivery to the queue");
                                    let _ = broker.nack(&queue, tag, true);
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(err) => {
                                warn!(queue = %queue, error = %err, "listen failed");
                                thread::sleep(poll_interval);
                            }
                        }
                    }
                    pool.shutdown();
                    info!(queue = %queue, "dispatcher stopped");
                })
                .map_err(|e| TransportError::Closed(format!("failed to start dispatcher: {e}")))?
        };

        Ok(Self {
            stop_tx,
            handle: Some(handle),
            counters,
        })
    }

    /// Current counters without stopping.
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Stop the listener, let in-flight commands finish and return stats.
    pub fn stop(mut self) -> DispatchStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.counters.snapshot()
    }

    /// Signal stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for DispatcherThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// Decode, handle and answer one delivery, then settle it with the broker.
fn process<S: RecordStore, B: Broker>(
    dispatcher: &Dispatcher<S>,
    broker: &B,
    queue: &str,
    delivery: Delivery,
    counters: &Counters,
) {
    let message = &delivery.message;
    let correlation_id = message.correlation_id.as_deref();
    let span = info_span!(
        "command",
        correlation_id = correlation_id.unwrap_or("-"),
        redelivered = delivery.redelivered,
    );
    let _entered = span.enter();

    let result = match CommandEnvelope::from_message(message) {
        Ok(envelope) => run_handler(dispatcher, &envelope),
        Err(err) => {
            warn!(error = %err, "undecodable command");
            Err(err)
        }
    };
    match &result {
        Ok(_) => counters.handled.fetch_add(1, Ordering::Relaxed),
        Err(_) => counters.failed.fetch_add(1, Ordering::Relaxed),
    };

    let Some(reply_to) = message.reply_to.as_deref() else {
        warn!("command has no reply_to, dropping result");
        settle(broker.ack(queue, delivery.tag));
        return;
    };

    let sent = encode_reply(correlation_id, &result).and_then(|reply| broker.send(reply_to, reply));
    match sent {
        Ok(()) => {
            debug!(reply_to, "reply sent");
            settle(broker.ack(queue, delivery.tag));
        }
        Err(TransportError::Unroutable(_)) => {
            warn!(reply_to, "caller is gone, dropping reply");
            settle(broker.ack(queue, delivery.tag));
        }
        Err(err) => {
            error!(reply_to, error = %err, "reply publish failed, requeueing command");
            counters.reply_failures.fetch_add(1, Ordering::Relaxed);
            settle(broker.nack(queue, delivery.tag, true));
        }
    }
}

fn run_handler<S: RecordStore>(dispatcher: &Dispatcher<S>, envelope: &CommandEnvelope) -> CommandResult {
    panic::catch_unwind(AssertUnwindSafe(|| dispatcher.handle(envelope))).unwrap_or_else(|_| {
        error!(action = %envelope.action, "handler panicked");
        Err(CommandError::Internal("handler panicked".to_string()))
    })
}

fn settle(result: Result<(), TransportError>) {
    if let Err(err) = result {
        warn!(error = %err, "failed to settle delivery");
    }
}
