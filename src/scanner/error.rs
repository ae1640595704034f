//! Scanner Error Types

use crate::core::shutdown::CancelReason;
use std::path::PathBuf;
use thiserror::Error;

/// Discovery failures. Any of them aborts the whole scan.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// The root path does not exist or is not a directory
    #[error("Scan root is not a directory: {}", path.display())]
    InvalidRoot { path: PathBuf },
    /// A directory could not be read while walking
    #[error("Failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    /// The run was cancelled before the walk finished
    #[error("Scan {0}")]
    Cancelled(CancelReason),
}

impl crate::core::error_handling::ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ScanError::InvalidRoot { .. } | ScanError::Io { .. })
    }

    fn user_message(&self) -> Option<String> {
        match self {
            ScanError::Cancelled(_) => None,
            other => Some(other.to_string()),
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
