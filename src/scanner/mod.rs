//! Repository discovery
//!
//! Walks a directory tree and produces the ordered list of git working
//! copies to operate on. Discovery is all-or-nothing: an unreadable
//! directory or a cancellation aborts it without a partial result.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{discover, discover_async, resolve_root, PROGRESS_INTERVAL};
pub use error::{ScanError, ScanResult};
pub use types::{RepositoryRef, ScanOptions, ScanProgress, GIT_METADATA_DIR};
