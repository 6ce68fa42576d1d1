//! Bounded pool limiting how many jobs are judged at once.
//!
//! Jobs beyond `max_concurrent_jobs` wait for a slot; once `queue_capacity` jobs are
//! already waiting, new ones are rejected with [`WorkerError::Busy`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};

#[derive(Debug, Clone)]
pub struct JudgePool {
    slots: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    max_concurrent_jobs: usize,
    queue_capacity: usize,
}

/// Held while a job runs; the slot is freed on drop.
#[derive(Debug)]
pub struct PoolSlot {
    _permit: OwnedSemaphorePermit,
}

/// Decrements the waiting counter even if the waiting future is dropped.
struct WaitingGuard(Arc<AtomicUsize>);

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl JudgePool {
    pub fn new(max_concurrent_jobs: usize, queue_capacity: usize) -> Self {
        let max_concurrent_jobs = max_concurrent_jobs.max(1);
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent_jobs)),
            waiting: Arc::new(AtomicUsize::new(0)),
            max_concurrent_jobs,
            queue_capacity,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.max_concurrent_jobs, config.queue_capacity)
    }

    pub fn running(&self) -> usize {
        self.max_concurrent_jobs - self.slots.available_permits()
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Take a slot, waiting in the queue if every slot is busy.
    pub async fn acquire(&self) -> Result<PoolSlot> {
        match self.slots.clone().try_acquire_owned() {
            Ok(permit) => return Ok(PoolSlot { _permit: permit }),
            Err(TryAcquireError::Closed) => return Err(WorkerError::PoolClosed),
            Err(TryAcquireError::NoPermits) => {}
        }

        let _guard = self.enqueue()?;
        debug!(waiting = self.waiting(), "Waiting for a free judge slot");
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::PoolClosed)?;
        Ok(PoolSlot { _permit: permit })
    }

    /// Run `job` once a slot is available.
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        let _slot = self.acquire().await?;
        Ok(job.await)
    }

    /// Stop handing out slots. Waiting and future callers get [`WorkerError::PoolClosed`].
    pub fn close(&self) {
        self.slots.close();
    }

    fn enqueue(&self) -> Result<WaitingGuard> {
        let reserved = self
            .waiting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |waiting| {
                (waiting < self.queue_capacity).then_some(waiting + 1)
            });
        match reserved {
            Ok(_) => Ok(WaitingGuard(self.waiting.clone())),
            Err(waiting) => Err(WorkerError::Busy {
                running: self.running(),
                queued: waiting,
            }),
        }
    }
}
