use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome classification of a submission.
///
/// A submission starts as [`Verdict::Pending`] and moves to exactly one terminal
/// verdict once judging completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Verdict {
    /// Waiting for judging to finish.
    Pending,
    /// Every test case produced the expected output.
    Accepted,
    /// Output did not match the expected output.
    WrongAnswer,
    /// The compiler rejected the source.
    CompilationError,
    /// The program ran past the wall-clock budget.
    TimeLimitExceeded,
    /// The program exited with a non-zero status.
    RuntimeError,
    /// Judging could not be carried out (I/O, spawn failure, bad test data).
    InternalError,
}

impl Verdict {
    /// Returns true if this is a final verdict (judging is complete).
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// All possible verdict values.
    pub const ALL: &'static [Verdict] = &[
        Self::Pending,
        Self::Accepted,
        Self::WrongAnswer,
        Self::CompilationError,
        Self::TimeLimitExceeded,
        Self::RuntimeError,
        Self::InternalError,
    ];

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "WrongAnswer",
            Self::CompilationError => "CompilationError",
            Self::TimeLimitExceeded => "TimeLimitExceeded",
            Self::RuntimeError => "RuntimeError",
            Self::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Verdict {
    fn default() -> Self {
        Self::Pending
    }
}

/// Error when parsing an invalid verdict string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid verdict '{invalid}'")]
pub struct ParseVerdictError {
    invalid: String,
}

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseVerdictError {
                invalid: s.to_string(),
            })
    }
}
