use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Verdict;

/// Why an execution did not succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FailureKind {
    /// Language identifier outside the supported set; nothing was spawned.
    UnsupportedLanguage,
    CompilationError,
    TimeLimitExceeded,
    RuntimeError,
    /// Spawn failure or I/O error inside the backend.
    InternalError,
}

impl FailureKind {
    /// Verdict a judged submission receives for this failure.
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::CompilationError => Verdict::CompilationError,
            Self::TimeLimitExceeded => Verdict::TimeLimitExceeded,
            Self::RuntimeError => Verdict::RuntimeError,
            Self::UnsupportedLanguage | Self::InternalError => Verdict::InternalError,
        }
    }
}

/// Either trimmed stdout or a failure with its diagnostic, never both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success {
        stdout: String,
    },
    Failure {
        kind: FailureKind,
        diagnostic: String,
    },
}

/// Result of one Execution Backend invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub outcome: ExecutionOutcome,
    /// Exit code of the last process that ran, if it exited normally.
    pub exit_code: Option<i32>,
    /// Wall-clock time of the run phase.
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn success(stdout: impl Into<String>, duration: Duration) -> Self {
        Self {
            outcome: ExecutionOutcome::Success {
                stdout: stdout.into(),
            },
            exit_code: Some(0),
            duration,
        }
    }

    pub fn failure(kind: FailureKind, diagnostic: impl Into<String>, duration: Duration) -> Self {
        Self {
            outcome: ExecutionOutcome::Failure {
                kind,
                diagnostic: diagnostic.into(),
            },
            exit_code: None,
            duration,
        }
    }

    pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            ExecutionOutcome::Success { .. } => None,
            ExecutionOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Engine-level wire response.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    pub error: String,
    pub execution_time_ms: u64,
}

impl From<ExecutionResult> for ExecuteResponse {
    fn from(result: ExecutionResult) -> Self {
        let execution_time_ms = result.duration_ms();
        match result.outcome {
            ExecutionOutcome::Success { stdout } => Self {
                success: true,
                output: stdout,
                error: String::new(),
                execution_time_ms,
            },
            ExecutionOutcome::Failure { diagnostic, .. } => Self {
                success: false,
                output: String::new(),
                error: diagnostic,
                execution_time_ms,
            },
        }
    }
}
