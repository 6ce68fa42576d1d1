use std::fmt;

/// Errors reported by the problem, submission and user stores.
#[derive(Debug)]
pub enum StoreError {
    /// The requested record does not exist.
    NotFound(String),
    /// The write would overwrite an existing record.
    Conflict(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// Any other failure of the backing store.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Conflict(what) => write!(f, "conflict: {what}"),
            Self::Io(err) => write!(f, "store IO error: {err}"),
            Self::Backend(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
