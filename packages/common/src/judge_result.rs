use serde::{Deserialize, Serialize};

use crate::Verdict;

/// Message reported when every test case passes.
pub const ACCEPTED_MESSAGE: &str = "All test cases passed";

/// Details of the first failing test case. Later cases are never reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailingCase {
    pub ordinal: u32,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
}

/// Judging-level wire response.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeResult {
    pub verdict: Verdict,
    /// Success message, program output on a mismatch, or the backend diagnostic.
    pub output: String,
    /// Sum of the durations of every case that actually ran.
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failing_case: Option<FailingCase>,
}

impl JudgeResult {
    /// Result for a judging run that could not be carried out.
    pub fn internal_error(message: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            verdict: Verdict::InternalError,
            output: message.into(),
            execution_time_ms,
            failing_case: None,
        }
    }
}

/// Status of a sample run: a verdict, or "executed" when nothing was compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "verdict", rename_all = "snake_case")]
pub enum RunStatus {
    Judged(Verdict),
    Executed,
}

/// Response to an interactive run. Never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRunResult {
    pub status: RunStatus,
    pub output: String,
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failing_case: Option<FailingCase>,
}
