use serde::{Deserialize, Serialize};

use crate::judge_job::{ExecuteRequest, JudgeRequest, SampleRunRequest};

/// Task used for worker to execute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(flatten)]
    pub payload: TaskPayload,
}

/// What a task asks the worker to do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    Execute(ExecuteRequest),
    Judge(JudgeRequest),
    Run(SampleRunRequest),
}

impl TaskPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Execute(_) => "execute",
            Self::Judge(_) => "judge",
            Self::Run(_) => "run",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    /// False only when the task could not be processed at all; a failed verdict is
    /// still a successful task.
    pub success: bool,
    pub output: serde_json::Value,
}

impl TaskResult {
    pub fn error(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            success: false,
            output: serde_json::json!({ "error": message.into() }),
        }
    }
}
