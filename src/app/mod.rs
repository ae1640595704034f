//! Application layer: command line, configuration, run orchestration and exit codes

pub mod cli;
pub mod error;
pub mod run;
pub mod startup;

pub use error::{RunError, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS};
pub use run::{execute, run_plain, RunOutcome};
