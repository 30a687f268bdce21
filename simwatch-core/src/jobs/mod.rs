//! Job lifecycle, event model, and process supervision.

mod events;
mod runner;
mod supervisor;

pub use events::{JobEvent, JobEventSink};
pub use runner::{JobConfig, RunnerConfig};
pub use supervisor::{JobError, JobState, JobSupervisor};
