use common::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Working directory error: {0}")]
    WorkDir(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Every slot is taken and the wait queue is full.
    #[error("Worker busy: {running} running, {queued} queued")]
    Busy { running: usize, queued: usize },

    #[error("Worker pool closed")]
    PoolClosed,

    #[error("Task error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
