use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the judge knows how to build and run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Python,
    Javascript,
}

impl Language {
    pub const ALL: &'static [Language] = &[Self::Cpp, Self::Python, Self::Javascript];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::Javascript => "javascript",
        }
    }

    /// Whether a compile phase precedes the run phase.
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Cpp)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection of a language identifier outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpp" => Ok(Self::Cpp),
            "python" => Ok(Self::Python),
            "javascript" => Ok(Self::Javascript),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}
