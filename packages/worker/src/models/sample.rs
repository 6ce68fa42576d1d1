use std::sync::Arc;

use common::{Language, Verdict};
use common::judge_result::{RunStatus, SampleRunResult};
use tracing::{info, instrument, warn};

use super::case::{CaseInput, CaseOutcome, evaluate_case};
use super::executor::CodeExecutor;

/// Ordinal reported for ad hoc runs; they are always a single case.
const SAMPLE_ORDINAL: u32 = 1;

/// Runs code against a single input for interactive "try it" requests.
///
/// Results are returned to the caller only. Nothing is persisted.
#[derive(Clone)]
pub struct SampleRunner {
    executor: Arc<dyn CodeExecutor>,
}

impl SampleRunner {
    pub fn new(executor: Arc<dyn CodeExecutor>) -> Self {
        Self { executor }
    }

    #[instrument(
        skip(self, code, input, expected_output),
        fields(compare = expected_output.is_some())
    )]
    pub async fn run(
        &self,
        code: &str,
        language: &str,
        input: &str,
        expected_output: Option<&str>,
    ) -> SampleRunResult {
        let language = match language.parse::<Language>() {
            Ok(language) => language,
            Err(e) => {
                warn!(error = %e, "Rejecting sample run");
                return SampleRunResult {
                    status: RunStatus::Judged(Verdict::InternalError),
                    output: e.to_string(),
                    execution_time_ms: 0,
                    failing_case: None,
                };
            }
        };

        let evaluation = evaluate_case(
            self.executor.as_ref(),
            code,
            language,
            CaseInput {
                ordinal: SAMPLE_ORDINAL,
                input,
                expected_output,
            },
        )
        .await;
        let execution_time_ms = evaluation.duration.as_millis() as u64;

        let result = match evaluation.outcome {
            CaseOutcome::Passed { output } => SampleRunResult {
                status: RunStatus::Judged(Verdict::Accepted),
                output,
                execution_time_ms,
                failing_case: None,
            },
            CaseOutcome::Executed { output } => SampleRunResult {
                status: RunStatus::Executed,
                output,
                execution_time_ms,
                failing_case: None,
            },
            CaseOutcome::Failed {
                verdict,
                diagnostic,
                failing_case,
            } => SampleRunResult {
                status: RunStatus::Judged(verdict),
                output: diagnostic,
                execution_time_ms,
                failing_case,
            },
        };

        info!(status = ?result.status, execution_time_ms, "Sample run finished");
        result
    }
}
