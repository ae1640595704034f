//! Run configuration and per-repository results

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

use crate::core::shutdown::CancelReason;
use crate::scanner::RepositoryRef;
use crate::vcs::{RepositoryAnalysis, VcsError};

/// Network operation applied to every repository in a run
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationKind {
    /// Download objects and update remote-tracking refs
    #[default]
    Fetch,
    /// Fetch, then fast-forward the working copy
    Pull,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Pull => "pull",
        }
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::iter().map(|kind| kind.name())
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        let lowercase = name.trim().to_lowercase();
        Self::iter().find(|kind| kind.name() == lowercase)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How progress and results are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Live terminal display driven by the progress model
    #[default]
    Interactive,
    /// Line-oriented log output followed by a summary
    Plain,
}

/// Validated settings for one run, shared read-only by every component
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub operation: OperationKind,
    /// Maximum items in flight, at least 1
    pub workers: usize,
    pub dry_run: bool,
    pub recursive: bool,
    pub skip_dirty: bool,
    /// Overall deadline; `None` runs without one
    pub timeout: Option<Duration>,
    pub exclude: Vec<String>,
    pub output_mode: OutputMode,
    pub full_summary: bool,
    pub verbose: bool,
    pub report_path: Option<PathBuf>,
}

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", "node_modules", "vendor"];

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            operation: OperationKind::Fetch,
            workers: DEFAULT_WORKERS,
            dry_run: false,
            recursive: true,
            skip_dirty: true,
            timeout: Some(DEFAULT_TIMEOUT),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            output_mode: OutputMode::Interactive,
            full_summary: false,
            verbose: false,
            report_path: None,
        }
    }
}

/// Which inspection step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStep {
    Open,
    Inspect,
}

impl fmt::Display for AnalysisStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStep::Open => write!(f, "open repository"),
            AnalysisStep::Inspect => write!(f, "analyze repository"),
        }
    }
}

/// Why a single repository did not succeed
///
/// Errors are recorded on the result and never abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("failed to {step}: {source}")]
    Analysis {
        step: AnalysisStep,
        #[source]
        source: VcsError,
    },

    /// Working copy has uncommitted changes and the run skips those
    #[error("repository has uncommitted changes (skipped)")]
    SkippedDirty,

    #[error("{operation} failed: {source}")]
    Operation {
        operation: OperationKind,
        #[source]
        source: VcsError,
    },

    #[error("{0} before completion")]
    Cancelled(CancelReason),

    /// The worker running this item died without producing a result
    #[error("worker failed: {0}")]
    Worker(String),
}

impl ItemError {
    /// Not attempted to completion, as opposed to a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, ItemError::SkippedDirty | ItemError::Cancelled(_))
    }
}

/// Outcome of processing one repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryResult {
    repository: RepositoryRef,
    branch: String,
    clean: bool,
    remote: String,
    error: Option<ItemError>,
    elapsed: Duration,
    dry_run: bool,
}

impl RepositoryResult {
    pub fn new(
        repository: RepositoryRef,
        analysis: Option<&RepositoryAnalysis>,
        error: Option<ItemError>,
        elapsed: Duration,
        dry_run: bool,
    ) -> Self {
        let (branch, clean, remote) = analysis
            .map(|a| (a.branch.clone(), a.clean, a.remote.clone()))
            .unwrap_or_default();
        Self {
            repository,
            branch,
            clean,
            remote,
            error,
            elapsed,
            dry_run,
        }
    }

    /// Result for an item that was never handed to a worker
    pub fn not_admitted(repository: RepositoryRef, reason: CancelReason) -> Self {
        Self::new(
            repository,
            None,
            Some(ItemError::Cancelled(reason)),
            Duration::ZERO,
            false,
        )
    }

    pub fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    pub fn name(&self) -> &str {
        self.repository.name()
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn is_clean(&self) -> bool {
        self.clean
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn error(&self) -> Option<&ItemError> {
        self.error.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Succeeded without running the operation
    pub fn is_dry_run(&self) -> bool {
        self.dry_run && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_round_trip() {
        let names: Vec<_> = OperationKind::names().collect();
        assert_eq!(names, vec!["fetch", "pull"]);
        assert_eq!(OperationKind::from_name("PULL"), Some(OperationKind::Pull));
        assert_eq!(OperationKind::from_name(" fetch "), Some(OperationKind::Fetch));
        assert_eq!(OperationKind::from_name("push"), None);
    }

    #[test]
    fn test_default_config_matches_documented_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.operation, OperationKind::Fetch);
        assert_eq!(config.workers, 5);
        assert!(config.recursive);
        assert!(config.skip_dirty);
        assert!(!config.dry_run);
        assert_eq!(config.timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.exclude, vec![".git", "node_modules", "vendor"]);
    }

    #[test]
    fn test_item_error_messages() {
        assert_eq!(
            ItemError::SkippedDirty.to_string(),
            "repository has uncommitted changes (skipped)"
        );
        let err = ItemError::Operation {
            operation: OperationKind::Pull,
            source: VcsError::NoRemote,
        };
        assert_eq!(err.to_string(), "pull failed: No remote configured");
        assert_eq!(
            ItemError::Cancelled(CancelReason::TimedOut).to_string(),
            "timed out before completion"
        );
    }

    #[test]
    fn test_not_admitted_result_carries_cancellation() {
        let repo = RepositoryRef::with_metadata(PathBuf::from("/w/a"), true);
        let result = RepositoryResult::not_admitted(repo, CancelReason::Interrupted);
        assert_eq!(
            result.error(),
            Some(&ItemError::Cancelled(CancelReason::Interrupted))
        );
        assert_eq!(result.elapsed(), Duration::ZERO);
        assert!(!result.is_dry_run());
        assert!(result.error().is_some_and(ItemError::is_skip));
    }

    #[test]
    fn test_only_non_attempts_are_skips() {
        assert!(ItemError::SkippedDirty.is_skip());
        assert!(ItemError::Cancelled(CancelReason::TimedOut).is_skip());
        assert!(!ItemError::Worker("gone".to_string()).is_skip());
        assert!(!ItemError::Operation {
            operation: OperationKind::Fetch,
            source: VcsError::NoRemote,
        }
        .is_skip());
    }
}
