pub mod run;
pub mod submission;

pub use run::{RunInput, RunService};
pub use submission::SubmissionService;
