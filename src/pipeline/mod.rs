//! Repository processing pipeline
//!
//! [`ItemProcessor`] does the work for one repository; [`Pipeline`] runs it
//! for many under a fixed concurrency limit and the shared shutdown signal.

pub mod orchestrator;
pub mod processor;
pub mod types;

pub use orchestrator::{Pipeline, PipelineEvent, PipelineHandle, PipelineOutcome};
pub use processor::ItemProcessor;
pub use types::{
    AnalysisStep, ItemError, OperationKind, OutputMode, RepositoryResult, RunConfig,
    DEFAULT_EXCLUDES, DEFAULT_TIMEOUT, DEFAULT_WORKERS,
};
