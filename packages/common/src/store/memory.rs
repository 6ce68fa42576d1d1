//! In-memory stores for the standalone worker and tests.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use uuid::Uuid;

use super::error::StoreError;
use super::traits::{ProblemStore, SubmissionStore, UserStore};
use crate::judge_job::TestCaseData;
use crate::submission::Submission;

#[derive(Debug, Clone, Default)]
struct ProblemData {
    test_cases: Vec<TestCaseData>,
    samples: Vec<TestCaseData>,
}

#[derive(Debug, Default)]
pub struct MemoryProblemStore {
    problems: DashMap<String, ProblemData>,
}

impl MemoryProblemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a problem. Cases are kept sorted by ordinal.
    pub fn insert(
        &self,
        problem_id: impl Into<String>,
        mut test_cases: Vec<TestCaseData>,
        mut samples: Vec<TestCaseData>,
    ) {
        test_cases.sort_by_key(|tc| tc.ordinal);
        samples.sort_by_key(|tc| tc.ordinal);
        self.problems.insert(
            problem_id.into(),
            ProblemData {
                test_cases,
                samples,
            },
        );
    }

    fn get(&self, problem_id: &str) -> Result<ProblemData, StoreError> {
        self.problems
            .get(problem_id)
            .map(|p| p.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("problem {problem_id}")))
    }
}

#[async_trait]
impl ProblemStore for MemoryProblemStore {
    async fn test_cases(&self, problem_id: &str) -> Result<Vec<TestCaseData>, StoreError> {
        Ok(self.get(problem_id)?.test_cases)
    }

    async fn sample_cases(&self, problem_id: &str) -> Result<Vec<TestCaseData>, StoreError> {
        Ok(self.get(problem_id)?.samples)
    }
}

#[derive(Debug, Default)]
pub struct MemorySubmissionStore {
    submissions: DashMap<Uuid, Submission>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<Submission> {
        self.submissions.get(id).map(|s| s.value().clone())
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn save(&self, submission: &Submission) -> Result<(), StoreError> {
        if !submission.verdict.is_final() {
            return Err(StoreError::Backend(format!(
                "submission {} has no final verdict",
                submission.id
            )));
        }
        match self.submissions.entry(submission.id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "submission {} already persisted",
                submission.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(submission.clone());
                debug!(
                    submission_id = %submission.id,
                    verdict = %submission.verdict,
                    "Submission saved"
                );
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserProgress {
    pub solved: HashSet<String>,
    pub accepted_count: u64,
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserProgress>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self, user_id: &str) -> UserProgress {
        self.users
            .get(user_id)
            .map(|p| p.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn record_solved(&self, user_id: &str, problem_id: &str) -> Result<bool, StoreError> {
        // The entry guard holds the shard lock, so set insert and counter bump are atomic.
        let mut progress = self.users.entry(user_id.to_string()).or_default();
        if !progress.solved.insert(problem_id.to_string()) {
            debug!(user_id, problem_id, "Problem already solved");
            return Ok(false);
        }
        progress.accepted_count += 1;
        Ok(true)
    }
}
