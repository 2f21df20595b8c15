//! Bounded worker pool.

use std::io;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of threads draining a bounded job queue.
///
/// `execute` blocks while `backlog` jobs are already queued, so a slow
/// dispatcher applies back-pressure to the listener instead of buffering
/// without limit.
pub struct WorkerPool {
    sender: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

/// The pool has shut down and no longer accepts jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolClosed;

impl WorkerPool {
    pub fn new(name: &str, size: usize, backlog: usize) -> io::Result<Self> {
        let (sender, receiver) = mpsc::sync_channel::<Job>(backlog);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size.max(1))
            .map(|index| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("{name}-{index}"))
                    .spawn(move || work(&receiver))
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queue a job, waiting for room if the backlog is full.
    pub fn execute<F>(&self, job: F) -> Result<(), PoolClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolClosed)?;
        sender.send(Box::new(job)).map_err(|_| PoolClosed)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting jobs, finish the queued ones and join every worker.
    pub fn shutdown(mut self) {
        self.join_all();
    }

    fn join_all(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_all();
    }
}

fn work(receiver: &Mutex<Receiver<Job>>) {
    loop {
        let job = {
            let receiver = receiver.lock().unwrap_or_else(PoisonError::into_inner);
            receiver.recv()
        };
        match job {
            Ok(job) => job(),
            Err(_) => break,
        }
    }
    debug!("worker exiting");
}
