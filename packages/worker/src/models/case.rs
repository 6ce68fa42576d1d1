//! Single test-case evaluation shared by judging and sample runs.

use std::time::Duration;

use common::judge_result::FailingCase;
use common::{ExecutionOutcome, FailureKind, Language, Verdict};

use super::executor::CodeExecutor;

/// Expected and actual output match when equal after trimming leading and trailing
/// whitespace. Internal whitespace is significant.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

#[derive(Debug, Clone, Copy)]
pub struct CaseInput<'a> {
    pub ordinal: u32,
    pub input: &'a str,
    /// `None` skips comparison.
    pub expected_output: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Output matched the expected output.
    Passed { output: String },
    /// Ran successfully; nothing to compare against.
    Executed { output: String },
    Failed {
        verdict: Verdict,
        /// Backend diagnostic, or the actual output on a mismatch.
        diagnostic: String,
        failing_case: Option<FailingCase>,
    },
}

#[derive(Debug, Clone)]
pub struct CaseEvaluation {
    pub outcome: CaseOutcome,
    pub duration: Duration,
}

/// Run `code` on one case and decide its outcome.
pub async fn evaluate_case(
    executor: &dyn CodeExecutor,
    code: &str,
    language: Language,
    case: CaseInput<'_>,
) -> CaseEvaluation {
    let result = executor.execute(code, language, case.input).await;
    let duration = result.duration;

    let report = |actual_output: &str| FailingCase {
        ordinal: case.ordinal,
        input: case.input.to_string(),
        expected_output: case.expected_output.unwrap_or_default().to_string(),
        actual_output: actual_output.to_string(),
    };

    let outcome = match result.outcome {
        ExecutionOutcome::Failure { kind, diagnostic } => {
            // Compilation and backend faults say nothing about this particular case.
            let failing_case = match kind {
                FailureKind::TimeLimitExceeded | FailureKind::RuntimeError => {
                    Some(report(&diagnostic))
                }
                FailureKind::CompilationError
                | FailureKind::InternalError
                | FailureKind::UnsupportedLanguage => None,
            };
            CaseOutcome::Failed {
                verdict: kind.verdict(),
                diagnostic,
                failing_case,
            }
        }
        ExecutionOutcome::Success { stdout } => match case.expected_output {
            None => CaseOutcome::Executed { output: stdout },
            Some(expected) if outputs_match(&stdout, expected) => {
                CaseOutcome::Passed { output: stdout }
            }
            Some(_) => CaseOutcome::Failed {
                verdict: Verdict::WrongAnswer,
                failing_case: Some(report(&stdout)),
                diagnostic: stdout,
            },
        },
    };

    CaseEvaluation { outcome, duration }
}
