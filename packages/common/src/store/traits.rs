use async_trait::async_trait;

use super::error::StoreError;
use crate::judge_job::TestCaseData;
use crate::submission::Submission;

/// Read-only source of a problem's test data.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Hidden test cases in their stored order.
    async fn test_cases(&self, problem_id: &str) -> Result<Vec<TestCaseData>, StoreError>;

    /// Sample cases shown in the problem statement, in stored order.
    async fn sample_cases(&self, problem_id: &str) -> Result<Vec<TestCaseData>, StoreError>;

    /// The first sample case, if the problem has any.
    async fn first_sample(&self, problem_id: &str) -> Result<Option<TestCaseData>, StoreError> {
        Ok(self.sample_cases(problem_id).await?.into_iter().next())
    }
}

/// Receives judged submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a judged submission.
    ///
    /// A submission is written exactly once; saving the same id again is a
    /// [`StoreError::Conflict`].
    async fn save(&self, submission: &Submission) -> Result<(), StoreError>;
}

/// Per-user solved-state.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Add `problem_id` to the user's solved set and bump their accepted counter.
    ///
    /// Idempotent: returns `false` and changes nothing if the problem was already solved.
    async fn record_solved(&self, user_id: &str, problem_id: &str) -> Result<bool, StoreError>;
}
