//! Command-line workflow: argument mapping and release orchestration

pub mod args;
pub mod orchestration;

pub use args::Args;
pub use orchestration::{execute_release, plan_release, run_release, ReleasePlan, ReleaseReport, RunOutcome};
