//! VCS data types

/// Branch name reported when HEAD is not on a branch
pub const DETACHED_HEAD: &str = "detached";

/// Name of the remote preferred when several are configured
pub const DEFAULT_REMOTE: &str = "origin";

/// Snapshot of a working copy taken before any network operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryAnalysis {
    /// Short branch name, or [`DETACHED_HEAD`]
    pub branch: String,
    /// No uncommitted changes to tracked files
    pub clean: bool,
    /// Remote to operate against; empty when none is configured
    pub remote: String,
}

impl RepositoryAnalysis {
    pub fn is_detached(&self) -> bool {
        self.branch == DETACHED_HEAD
    }

    pub fn has_remote(&self) -> bool {
        !self.remote.is_empty()
    }
}

/// What a fetch or pull changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New objects or refs arrived, or the working copy moved
    Updated,
    /// Already up to date
    NoChange,
}

/// Pick the remote to use: `origin` when present, otherwise the first name
pub fn preferred_remote<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut first = None;
    for name in names {
        let name = name.as_ref();
        if name == DEFAULT_REMOTE {
            return name.to_string();
        }
        if first.is_none() {
            first = Some(name.to_string());
        }
    }
    first.unwrap_or_default()
}
