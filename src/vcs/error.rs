//! VCS Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`VcsClient`](crate::vcs::VcsClient)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VcsError {
    /// The path does not hold a usable git repository
    #[error("Not a git repository: {} ({message})", path.display())]
    NotARepository { path: PathBuf, message: String },

    /// Branch, status or remote inspection failed
    #[error("Failed to inspect repository: {message}")]
    Inspect { message: String },

    /// No remote is configured, so there is nothing to fetch from
    #[error("No remote configured")]
    NoRemote,

    /// Connecting to or transferring from the remote failed
    #[error("Remote '{remote}' failed: {message}")]
    Network { remote: String, message: String },

    /// HEAD does not point at a branch
    #[error("HEAD is detached, nothing to merge into")]
    DetachedHead,

    /// The current branch has no upstream tracking branch
    #[error("Branch '{branch}' has no upstream tracking branch")]
    NoUpstream { branch: String },

    /// The upstream could not be merged as a fast-forward
    #[error("Fast-forward merge failed: {message}")]
    Merge { message: String },

    /// The shared cancellation flag fired during the call
    #[error("Operation cancelled")]
    Cancelled,
}

impl VcsError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VcsError::Cancelled)
    }
}

pub type VcsResult<T> = Result<T, VcsError>;
