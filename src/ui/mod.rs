//! Live progress display
//!
//! [`model`] holds the state machine, [`render`] turns it into lines and
//! [`runtime`] connects it to the terminal, the scanner and the pipeline.

pub mod model;
pub mod render;
pub mod runtime;

pub use model::{Command, Message, Phase, ProgressModel};
pub use runtime::{run_interactive, InteractiveOutcome};
