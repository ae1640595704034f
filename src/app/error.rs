//! Run-level errors
//!
//! Per-repository failures live on each result. These are the failures that
//! end the run as a whole and decide the process exit code.

use thiserror::Error;

use crate::app::cli::config::ConfigError;
use crate::core::error_handling::ContextualError;
use crate::core::shutdown::CancelReason;
use crate::scanner::ScanError;

/// Exit status for a run that completed without failures
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for failed items, discovery errors, timeouts and bad configuration
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when the user interrupted the run
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to find repositories: {0}")]
    Discovery(ScanError),

    #[error("Run {0}")]
    Cancelled(CancelReason),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Runtime(String),
}

impl From<ScanError> for RunError {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::Cancelled(reason) => RunError::Cancelled(reason),
            other => RunError::Discovery(other),
        }
    }
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Cancelled(CancelReason::Interrupted) => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }
}

impl ContextualError for RunError {
    fn is_user_actionable(&self) -> bool {
        match self {
            RunError::Discovery(e) => e.is_user_actionable(),
            RunError::Config(e) => e.is_user_actionable(),
            RunError::Cancelled(_) => true,
            RunError::Runtime(_) => false,
        }
    }

    fn user_message(&self) -> Option<String> {
        match self {
            RunError::Discovery(e) => e.user_message().map(|m| format!("Failed to find repositories: {}", m)),
            RunError::Config(e) => e.user_message(),
            RunError::Cancelled(_) => Some(self.to_string()),
            RunError::Runtime(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_scan_cancellation_becomes_run_cancellation() {
        let error = RunError::from(ScanError::Cancelled(CancelReason::TimedOut));
        assert!(matches!(error, RunError::Cancelled(CancelReason::TimedOut)));
        assert_eq!(error.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_interrupt_exit_code() {
        assert_eq!(
            RunError::Cancelled(CancelReason::Interrupted).exit_code(),
            EXIT_INTERRUPTED
        );
    }

    #[test]
    fn test_discovery_error_is_user_actionable() {
        let error = RunError::from(ScanError::InvalidRoot {
            path: PathBuf::from("/nope"),
        });
        assert!(error.is_user_actionable());
        assert_eq!(
            error.user_message().as_deref(),
            Some("Failed to find repositories: Scan root is not a directory: /nope")
        );
        assert_eq!(error.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_runtime_error_is_not_user_actionable() {
        let error = RunError::Runtime("pipeline stopped".to_string());
        assert!(!error.is_user_actionable());
        assert!(error.user_message().is_none());
    }
}
