//! VCS capability seam
//!
//! The pipeline only talks to git through [`VcsClient`], so tests can swap
//! in a scripted fake and the gix-backed client stays isolated here.

use std::path::Path;

use crate::core::shutdown::ShutdownSignal;
use crate::vcs::error::VcsResult;
use crate::vcs::types::{RepositoryAnalysis, SyncOutcome};

/// Blocking git operations on a single working copy
///
/// Implementations are shared by every worker and must tolerate concurrent
/// calls for different repositories. Network calls poll `signal` at I/O
/// boundaries and return [`VcsError::Cancelled`](crate::vcs::VcsError::Cancelled)
/// once it has fired.
pub trait VcsClient: Send + Sync + 'static {
    /// Opened repository state, owned by one worker for one item
    type Handle: Send;

    fn open(&self, path: &Path) -> VcsResult<Self::Handle>;

    fn analyze(&self, handle: &Self::Handle) -> VcsResult<RepositoryAnalysis>;

    /// Download objects and update remote-tracking refs only
    fn fetch(
        &self,
        handle: &Self::Handle,
        remote: &str,
        signal: &ShutdownSignal,
    ) -> VcsResult<SyncOutcome>;

    /// Fetch, then fast-forward the current branch to its upstream
    fn pull(
        &self,
        handle: &Self::Handle,
        remote: &str,
        signal: &ShutdownSignal,
    ) -> VcsResult<SyncOutcome>;
}
