use std::sync::Arc;

use common::Verdict;
use common::judge_result::{RunStatus, SampleRunResult};
use common::store::ProblemStore;
use tracing::{instrument, warn};

use crate::models::sample::SampleRunner;

pub const NO_SAMPLE_MESSAGE: &str = "Problem has no sample test cases";

/// Where a run takes its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunInput {
    /// The problem's first sample case, compared against its expected output.
    FirstSample,
    Custom {
        input: String,
        expected_output: Option<String>,
    },
}

/// Interactive runs against a problem. Never persists anything.
#[derive(Clone)]
pub struct RunService {
    problems: Arc<dyn ProblemStore>,
    runner: SampleRunner,
}

impl RunService {
    pub fn new(problems: Arc<dyn ProblemStore>, runner: SampleRunner) -> Self {
        Self { problems, runner }
    }

    #[instrument(skip(self, code, input))]
    pub async fn run(
        &self,
        problem_id: &str,
        code: &str,
        language: &str,
        input: RunInput,
    ) -> SampleRunResult {
        let (input, expected_output) = match input {
            RunInput::Custom {
                input,
                expected_output,
            } => (input, expected_output),
            RunInput::FirstSample => match self.load_first_sample(problem_id).await {
                Ok(pair) => pair,
                Err(message) => {
                    warn!(%message, "Cannot run sample");
                    return SampleRunResult {
                        status: RunStatus::Judged(Verdict::InternalError),
                        output: message,
                        execution_time_ms: 0,
                        failing_case: None,
                    };
                }
            },
        };

        self.runner
            .run(code, language, &input, expected_output.as_deref())
            .await
    }

    async fn load_first_sample(
        &self,
        problem_id: &str,
    ) -> std::result::Result<(String, Option<String>), String> {
        let sample = self
            .problems
            .first_sample(problem_id)
            .await
            .map_err(|e| format!("Failed to load sample test case: {e}"))?
            .ok_or_else(|| NO_SAMPLE_MESSAGE.to_string())?;
        let input = sample
            .input
            .load()
            .await
            .map_err(|e| format!("Failed to read sample input: {e}"))?;
        let expected = sample
            .expected_output
            .load()
            .await
            .map_err(|e| format!("Failed to read sample output: {e}"))?;
        Ok((input, Some(expected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::judge_job::TestCaseData;
    use common::store::memory::MemoryProblemStore;
    use common::{ExecutionResult, Language};
    use std::time::Duration;

    use crate::models::executor::CodeExecutor;

    struct Echo;

    #[async_trait]
    impl CodeExecutor for Echo {
        async fn execute(&self, _code: &str, _language: Language, stdin: &str) -> ExecutionResult {
            ExecutionResult::success(stdin.trim(), Duration::from_millis(1))
        }
    }

    fn service() -> RunService {
        let problems = Arc::new(MemoryProblemStore::new());
        problems.insert(
            "sum",
            vec![TestCaseData::new(1, "hidden", "hidden")],
            vec![
                TestCaseData::new(2, "second", "second"),
                TestCaseData::new(1, "first", "first\n"),
            ],
        );
        problems.insert("bare", vec![TestCaseData::new(1, "x", "x")], vec![]);
        RunService::new(problems, SampleRunner::new(Arc::new(Echo)))
    }

    #[tokio::test]
    async fn test_first_sample_is_judged() {
        let result = service()
            .run("sum", "", "python", RunInput::FirstSample)
            .await;
        assert_eq!(result.status, RunStatus::Judged(Verdict::Accepted));
        assert_eq!(result.output, "first");
    }

    #[tokio::test]
    async fn test_custom_input_without_expected_output() {
        let result = service()
            .run(
                "sum",
                "",
                "python",
                RunInput::Custom {
                    input: "mine".into(),
                    expected_output: None,
                },
            )
            .await;
        assert_eq!(result.status, RunStatus::Executed);
        assert_eq!(result.output, "mine");
    }

    #[tokio::test]
    async fn test_problem_without_samples() {
        let result = service()
            .run("bare", "", "python", RunInput::FirstSample)
            .await;
        assert_eq!(result.status, RunStatus::Judged(Verdict::InternalError));
        assert_eq!(result.output, NO_SAMPLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_custom_input_works_without_samples() {
        let result = service()
            .run(
                "bare",
                "",
                "javascript",
                RunInput::Custom {
                    input: "1".into(),
                    expected_output: Some("2".into()),
                },
            )
            .await;
        assert_eq!(result.status, RunStatus::Judged(Verdict::WrongAnswer));
    }
}
