pub mod execution;
pub mod judge_job;
pub mod judge_result;
pub mod language;
pub mod store;
pub mod submission;
pub mod verdict;
pub mod worker;

pub use execution::{ExecuteResponse, ExecutionOutcome, ExecutionResult, FailureKind};
pub use language::{Language, UnsupportedLanguage};
pub use verdict::{ParseVerdictError, Verdict};
