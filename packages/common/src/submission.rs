use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Verdict;
use crate::judge_result::JudgeResult;

/// A judged (or to-be-judged) submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: String,
    pub problem_id: String,
    pub code: String,
    pub language: String,
    pub verdict: Verdict,
    pub output: String,
    pub execution_time_ms: u64,
    pub created_at: DateTime<Utc>,
    pub judged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Submission {id} already has final verdict {verdict}")]
pub struct AlreadyJudged {
    pub id: Uuid,
    pub verdict: Verdict,
}

impl Submission {
    pub fn new(
        user_id: impl Into<String>,
        problem_id: impl Into<String>,
        code: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            problem_id: problem_id.into(),
            code: code.into(),
            language: language.into(),
            verdict: Verdict::Pending,
            output: String::new(),
            execution_time_ms: 0,
            created_at: Utc::now(),
            judged_at: None,
        }
    }

    /// Move from Pending to the judged verdict. Only allowed once.
    pub fn finalize(&mut self, result: &JudgeResult) -> Result<(), AlreadyJudged> {
        if self.verdict.is_final() {
            return Err(AlreadyJudged {
                id: self.id,
                verdict: self.verdict,
            });
        }
        self.verdict = result.verdict;
        self.output = result.output.clone();
        self.execution_time_ms = result.execution_time_ms;
        self.judged_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge_result::ACCEPTED_MESSAGE;

    fn accepted() -> JudgeResult {
        JudgeResult {
            verdict: Verdict::Accepted,
            output: ACCEPTED_MESSAGE.into(),
            execution_time_ms: 40,
            failing_case: None,
        }
    }

    #[test]
    fn test_new_submission_is_pending() {
        let submission = Submission::new("alice", "p1", "print(1)", "python");
        assert_eq!(submission.verdict, Verdict::Pending);
        assert!(submission.judged_at.is_none());
    }

    #[test]
    fn test_finalize_only_once() {
        let mut submission = Submission::new("alice", "p1", "print(1)", "python");
        submission.finalize(&accepted()).unwrap();
        assert_eq!(submission.verdict, Verdict::Accepted);
        assert_eq!(submission.execution_time_ms, 40);
        assert!(submission.judged_at.is_some());

        let err = submission
            .finalize(&JudgeResult::internal_error("late", 0))
            .unwrap_err();
        assert_eq!(err.verdict, Verdict::Accepted);
        assert_eq!(submission.verdict, Verdict::Accepted);
    }
}
