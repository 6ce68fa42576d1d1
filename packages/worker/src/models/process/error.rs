use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} pipe unavailable")]
    Pipe(&'static str),

    #[error("process I/O error: {0}")]
    Io(#[from] std::io::Error),
}
