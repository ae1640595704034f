//! Git access for the pipeline

pub mod client;
pub mod error;
pub mod gix_client;
pub mod types;

pub use client::VcsClient;
pub use error::{VcsError, VcsResult};
pub use gix_client::GixClient;
pub use types::{RepositoryAnalysis, SyncOutcome, DEFAULT_REMOTE, DETACHED_HEAD};
