use std::sync::Arc;

use common::Verdict;
use common::judge_result::JudgeResult;
use common::store::{ProblemStore, SubmissionStore, UserStore};
use common::submission::Submission;
use tracing::{info, instrument, warn};

use crate::error::{Result, WorkerError};
use crate::models::judge::Judge;

/// Full submission flow: judge against hidden tests, persist once, update solved-state.
#[derive(Clone)]
pub struct SubmissionService {
    problems: Arc<dyn ProblemStore>,
    submissions: Arc<dyn SubmissionStore>,
    users: Arc<dyn UserStore>,
    judge: Judge,
}

impl SubmissionService {
    pub fn new(
        problems: Arc<dyn ProblemStore>,
        submissions: Arc<dyn SubmissionStore>,
        users: Arc<dyn UserStore>,
        judge: Judge,
    ) -> Self {
        Self {
            problems,
            submissions,
            users,
            judge,
        }
    }

    /// Judge `code` for `problem_id` on behalf of `user_id`.
    ///
    /// The verdict is always recorded; a failure to read test data becomes an
    /// InternalError verdict. Only failures to write the result are returned as errors.
    #[instrument(skip(self, code))]
    pub async fn submit(
        &self,
        user_id: &str,
        problem_id: &str,
        code: &str,
        language: &str,
    ) -> Result<Submission> {
        let mut submission = Submission::new(user_id, problem_id, code, language);
        info!(submission_id = %submission.id, "Submission received");

        let result = match self.problems.test_cases(problem_id).await {
            Ok(test_cases) => self.judge.judge(code, language, &test_cases).await,
            Err(e) => {
                warn!(error = %e, "Failed to load test cases");
                JudgeResult::internal_error(format!("Failed to load test cases: {e}"), 0)
            }
        };

        submission
            .finalize(&result)
            .map_err(|e| WorkerError::Task(e.to_string()))?;
        self.submissions.save(&submission).await?;

        if submission.verdict == Verdict::Accepted {
            let newly_solved = self.users.record_solved(user_id, problem_id).await?;
            info!(newly_solved, "Recorded solved problem");
        }

        info!(
            submission_id = %submission.id,
            verdict = %submission.verdict,
            execution_time_ms = submission.execution_time_ms,
            "Submission judged"
        );
        Ok(submission)
    }
}
