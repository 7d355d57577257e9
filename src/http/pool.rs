//! Fixed-size pool of OS threads for connection handling.
//!
//! Jobs go through a bounded channel; when every worker is busy and the queue
//! is full, `execute` blocks the submitter (the accept thread) instead of
//! spawning more threads. Dropping the pool closes the channel: queued jobs
//! still run, then the workers exit.

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, thiserror::Error)]
#[error("worker pool is shut down")]
pub struct PoolClosed;

pub struct WorkerPool {
    sender: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers sharing a queue of `queue_bound` pending jobs.
    pub fn new(size: usize, queue_bound: usize) -> std::io::Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = mpsc::sync_channel::<Job>(queue_bound);
        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let rx = Arc::clone(&receiver);
            let handle = std::thread::Builder::new()
                .name(format!("packserve-worker-{}", id))
                .spawn(move || worker_loop(id, rx))?;
            workers.push(handle);
        }
        tracing::debug!("Started worker pool with {} workers", size);
        Ok(WorkerPool {
            sender: Some(sender),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn execute<F>(&self, job: F) -> Result<(), PoolClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolClosed)?;
        sender.send(Box::new(job)).map_err(|_| PoolClosed)
    }

    /// Stop taking new work. Workers finish what is queued, then exit on their own.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_some() {
            tracing::debug!("Worker pool closed to new work");
        }
    }

    /// Close the queue and wait for every worker to exit.
    pub fn join(mut self) {
        self.shutdown();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(id: usize, receiver: Arc<Mutex<Receiver<Job>>>) {
    loop {
        // Lock only long enough to take one job.
        let job = receiver.lock().recv();
        match job {
            Ok(job) => {
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
                    tracing::error!("worker {}: connection handler panicked", id);
                }
            }
            Err(_) => {
                tracing::trace!("worker {} exiting", id);
                return;
            }
        }
    }
}
