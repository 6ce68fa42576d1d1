use std::sync::Arc;

use common::ExecuteResponse;
use common::worker::{Task, TaskPayload, TaskResult};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::executor::CodeExecutor;
use super::judge::Judge;
use super::pool::JudgePool;
use super::sample::SampleRunner;
use crate::error::WorkerError;

/// Dispatches tasks to the backend, the judge or the sample runner, bounded by a pool.
#[derive(Clone)]
pub struct Worker {
    executor: Arc<dyn CodeExecutor>,
    judge: Judge,
    sample_runner: SampleRunner,
    pool: JudgePool,
}

impl Worker {
    pub fn new(executor: Arc<dyn CodeExecutor>, pool: JudgePool) -> Self {
        Self {
            judge: Judge::new(executor.clone()),
            sample_runner: SampleRunner::new(executor.clone()),
            executor,
            pool,
        }
    }

    pub fn pool(&self) -> &JudgePool {
        &self.pool
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, kind = task.payload.kind()))]
    pub async fn execute_task(&self, task: Task) -> TaskResult {
        let Task { id, payload } = task;

        let output = match self.pool.run(self.dispatch(payload)).await {
            Ok(output) => output,
            Err(e @ WorkerError::Busy { .. }) => {
                warn!(error = %e, "Rejecting task");
                return TaskResult::error(id, e.to_string());
            }
            Err(e) => {
                error!(error = %e, "Task could not be scheduled");
                return TaskResult::error(id, e.to_string());
            }
        };

        match output {
            Ok(output) => {
                info!("Task completed");
                TaskResult {
                    task_id: id,
                    success: true,
                    output,
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to encode task output");
                TaskResult::error(id, e.to_string())
            }
        }
    }

    async fn dispatch(&self, payload: TaskPayload) -> serde_json::Result<serde_json::Value> {
        match payload {
            TaskPayload::Execute(req) => {
                let result = self
                    .executor
                    .execute_raw(&req.code, &req.language, &req.stdin)
                    .await;
                encode(&ExecuteResponse::from(result))
            }
            TaskPayload::Judge(req) => {
                let result = self
                    .judge
                    .judge(&req.code, &req.language, &req.test_cases)
                    .await;
                encode(&result)
            }
            TaskPayload::Run(req) => {
                let result = self
                    .sample_runner
                    .run(
                        &req.code,
                        &req.language,
                        &req.input,
                        req.expected_output.as_deref(),
                    )
                    .await;
                encode(&result)
            }
        }
    }
}

fn encode<T: Serialize>(value: &T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(value)
}
