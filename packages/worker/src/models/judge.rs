//! Judging orchestrator.
//!
//! Runs a submission against its test cases one at a time in stored order and stops
//! at the first failure. Cases are never run in parallel: which failure gets reported
//! must not depend on scheduling.

use std::sync::Arc;
use std::time::Duration;

use common::{Language, Verdict};
use common::judge_job::TestCaseData;
use common::judge_result::{ACCEPTED_MESSAGE, JudgeResult};
use tracing::{debug, info, instrument, warn};

use super::case::{CaseInput, CaseOutcome, evaluate_case};
use super::executor::CodeExecutor;

pub const NO_TEST_CASES_MESSAGE: &str = "Problem has no test cases";

#[derive(Clone)]
pub struct Judge {
    executor: Arc<dyn CodeExecutor>,
}

impl Judge {
    pub fn new(executor: Arc<dyn CodeExecutor>) -> Self {
        Self { executor }
    }

    #[instrument(skip(self, code, test_cases), fields(test_cases = test_cases.len()))]
    pub async fn judge(
        &self,
        code: &str,
        language: &str,
        test_cases: &[TestCaseData],
    ) -> JudgeResult {
        let language = match language.parse::<Language>() {
            Ok(language) => language,
            Err(e) => {
                warn!(error = %e, "Rejecting submission");
                return JudgeResult::internal_error(e.to_string(), 0);
            }
        };

        if test_cases.is_empty() {
            warn!("No test cases to judge against");
            return JudgeResult::internal_error(NO_TEST_CASES_MESSAGE, 0);
        }

        let mut total = Duration::ZERO;

        for case in test_cases {
            let (input, expected) = match load_case(case).await {
                Ok(payloads) => payloads,
                Err(e) => {
                    warn!(ordinal = case.ordinal, error = %e, "Failed to read test case");
                    return JudgeResult::internal_error(
                        format!("Failed to read test case {}: {e}", case.ordinal),
                        total.as_millis() as u64,
                    );
                }
            };

            let evaluation = evaluate_case(
                self.executor.as_ref(),
                code,
                language,
                CaseInput {
                    ordinal: case.ordinal,
                    input: &input,
                    expected_output: Some(&expected),
                },
            )
            .await;
            total += evaluation.duration;

            match evaluation.outcome {
                CaseOutcome::Passed { .. } | CaseOutcome::Executed { .. } => {
                    debug!(
                        ordinal = case.ordinal,
                        duration_ms = evaluation.duration.as_millis() as u64,
                        "Test case passed"
                    );
                }
                CaseOutcome::Failed {
                    verdict,
                    diagnostic,
                    failing_case,
                } => {
                    info!(
                        ordinal = case.ordinal,
                        %verdict,
                        total_ms = total.as_millis() as u64,
                        "Judging stopped at failing test case"
                    );
                    return JudgeResult {
                        verdict,
                        output: diagnostic,
                        execution_time_ms: total.as_millis() as u64,
                        failing_case,
                    };
                }
            }
        }

        info!(total_ms = total.as_millis() as u64, "All test cases passed");
        JudgeResult {
            verdict: Verdict::Accepted,
            output: ACCEPTED_MESSAGE.to_string(),
            execution_time_ms: total.as_millis() as u64,
            failing_case: None,
        }
    }
}

async fn load_case(case: &TestCaseData) -> std::io::Result<(String, String)> {
    let input = case.input.load().await?;
    let expected = case.expected_output.load().await?;
    Ok((input, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::judge_job::TestPayload;
    use common::{ExecutionResult, FailureKind};
    use std::sync::Mutex;

    /// Echoes stdin after a fixed "duration"; inputs listed in `fail_on` crash instead.
    struct Scripted {
        calls: Mutex<Vec<String>>,
        fail_on: Vec<(&'static str, FailureKind)>,
    }

    impl Scripted {
        fn new(fail_on: Vec<(&'static str, FailureKind)>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_on,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CodeExecutor for Scripted {
        async fn execute(&self, _code: &str, _language: Language, stdin: &str) -> ExecutionResult {
            self.calls.lock().unwrap().push(stdin.to_string());
            let duration = Duration::from_millis(10);
            match self.fail_on.iter().find(|(input, _)| *input == stdin) {
                Some((_, kind)) => ExecutionResult::failure(*kind, "boom", duration),
                None => ExecutionResult::success(stdin.trim(), duration),
            }
        }
    }

    fn cases(pairs: &[(&str, &str)]) -> Vec<TestCaseData> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (input, expected))| TestCaseData::new(i as u32 + 1, *input, *expected))
            .collect()
    }

    #[tokio::test]
    async fn test_all_cases_pass() {
        let executor = Scripted::new(vec![]);
        let judge = Judge::new(executor.clone());
        let result = judge
            .judge("", "python", &cases(&[("1", "1\n"), ("2", "2"), ("3", " 3 ")]))
            .await;
        assert_eq!(result.verdict, Verdict::Accepted);
        assert_eq!(result.output, ACCEPTED_MESSAGE);
        assert_eq!(result.execution_time_ms, 30);
        assert!(result.failing_case.is_none());
        assert_eq!(executor.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_stops_at_first_wrong_answer() {
        let executor = Scripted::new(vec![]);
        let judge = Judge::new(executor.clone());
        let result = judge
            .judge(
                "",
                "python",
                &cases(&[("1", "1"), ("2", "two"), ("3", "three"), ("4", "4")]),
            )
            .await;
        assert_eq!(result.verdict, Verdict::WrongAnswer);
        assert_eq!(result.output, "2");
        assert_eq!(result.execution_time_ms, 20);
        assert_eq!(result.failing_case.unwrap().ordinal, 2);
        assert_eq!(executor.calls(), vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_kind_becomes_verdict() {
        let executor = Scripted::new(vec![("2", FailureKind::TimeLimitExceeded)]);
        let judge = Judge::new(executor.clone());
        let result = judge
            .judge("", "cpp", &cases(&[("1", "1"), ("2", "2"), ("3", "3")]))
            .await;
        assert_eq!(result.verdict, Verdict::TimeLimitExceeded);
        assert_eq!(result.output, "boom");
        assert_eq!(result.execution_time_ms, 20);
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_compilation_error_on_first_case() {
        let executor = Scripted::new(vec![("1", FailureKind::CompilationError)]);
        let judge = Judge::new(executor.clone());
        let result = judge
            .judge("", "cpp", &cases(&[("1", "1"), ("2", "2")]))
            .await;
        assert_eq!(result.verdict, Verdict::CompilationError);
        assert!(result.failing_case.is_none());
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_case_list_is_internal_error() {
        let executor = Scripted::new(vec![]);
        let judge = Judge::new(executor.clone());
        let result = judge.judge("", "python", &[]).await;
        assert_eq!(result.verdict, Verdict::InternalError);
        assert_eq!(result.output, NO_TEST_CASES_MESSAGE);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_language_runs_nothing() {
        let executor = Scripted::new(vec![]);
        let judge = Judge::new(executor.clone());
        let result = judge.judge("", "brainfuck", &cases(&[("1", "1")])).await;
        assert_eq!(result.verdict, Verdict::InternalError);
        assert!(result.output.contains("Unsupported language"));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_payload_stops_judging() {
        let executor = Scripted::new(vec![]);
        let judge = Judge::new(executor.clone());
        let mut test_cases = cases(&[("1", "1"), ("2", "2"), ("3", "3")]);
        test_cases[1].expected_output = TestPayload::File {
            path: "/nonexistent/judge/2.out".into(),
        };
        let result = judge.judge("", "python", &test_cases).await;
        assert_eq!(result.verdict, Verdict::InternalError);
        assert!(result.output.starts_with("Failed to read test case 2"));
        assert_eq!(result.execution_time_ms, 10);
        assert_eq!(executor.calls(), vec!["1".to_string()]);
    }
}
