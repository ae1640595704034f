//! Discovery data types

use std::path::{Path, PathBuf};

/// Name of the metadata entry that marks a git working copy
pub const GIT_METADATA_DIR: &str = ".git";

/// One discovered working copy
///
/// Created by the scanner and never mutated afterwards. Two references
/// may share a display name; the path is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    path: PathBuf,
    name: String,
    has_git: bool,
}

impl RepositoryRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let has_git = path.join(GIT_METADATA_DIR).exists();
        Self::with_metadata(path, has_git)
    }

    pub fn with_metadata(path: PathBuf, has_git: bool) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            has_git,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_git(&self) -> bool {
        self.has_git
    }
}

/// Periodic discovery notification for interactive consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Working copies found so far
    pub found: usize,
    /// Most recently found working copy
    pub current: PathBuf,
}

/// Options that shape the walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Keep descending into a working copy to find nested ones
    pub recursive: bool,
    /// Substrings of root-relative paths that prune an entry and its subtree
    pub exclude: Vec<String>,
}
