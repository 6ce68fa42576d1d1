pub mod case;
pub mod executor;
pub mod judge;
pub mod language;
pub mod pool;
pub mod process;
pub mod sample;
pub mod worker;
pub mod workspace;

pub use executor::{CodeExecutor, ProcessExecutor};
pub use judge::Judge;
pub use pool::JudgePool;
pub use sample::SampleRunner;
pub use worker::Worker;
pub use workspace::WorkDir;
