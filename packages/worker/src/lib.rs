pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

pub use config::{ExecutionConfig, WorkerAppConfig, WorkerConfig};
pub use error::{Result, WorkerError};
pub use handlers::{RunInput, RunService, SubmissionService};
pub use models::{CodeExecutor, Judge, JudgePool, ProcessExecutor, SampleRunner, WorkDir, Worker};
