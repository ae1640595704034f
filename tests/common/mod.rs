//! Shared test fixtures: a scripted VCS client and working-copy trees

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use git_herd::core::shutdown::ShutdownSignal;
use git_herd::scanner::RepositoryRef;
use git_herd::vcs::{RepositoryAnalysis, SyncOutcome, VcsClient, VcsError, VcsResult};

const POLL_STEP: Duration = Duration::from_millis(5);

/// Scripted behaviour for one repository, looked up by directory name
#[derive(Debug, Clone)]
pub struct FakeRepo {
    pub branch: String,
    pub clean: bool,
    pub remote: String,
    pub open_error: Option<VcsError>,
    pub operation_error: Option<VcsError>,
    pub outcome: SyncOutcome,
}

impl Default for FakeRepo {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
            clean: true,
            remote: "origin".to_string(),
            open_error: None,
            operation_error: None,
            outcome: SyncOutcome::Updated,
        }
    }
}

impl FakeRepo {
    pub fn dirty() -> Self {
        Self {
            clean: false,
            ..Default::default()
        }
    }

    pub fn unchanged() -> Self {
        Self {
            outcome: SyncOutcome::NoChange,
            ..Default::default()
        }
    }

    pub fn failing(error: VcsError) -> Self {
        Self {
            operation_error: Some(error),
            ..Default::default()
        }
    }

    pub fn unopenable() -> Self {
        Self {
            open_error: Some(VcsError::NotARepository {
                path: PathBuf::from("broken"),
                message: "not a git repository".to_string(),
            }),
            ..Default::default()
        }
    }
}

/// In-memory [`VcsClient`] that records how it was driven
#[derive(Debug, Default)]
pub struct FakeVcs {
    repos: Mutex<HashMap<String, FakeRepo>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fetches: AtomicUsize,
    pulls: AtomicUsize,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every network call takes `delay`, polling the signal while it waits
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn script(self, name: &str, repo: FakeRepo) -> Self {
        if let Ok(mut repos) = self.repos.lock() {
            repos.insert(name.to_string(), repo);
        }
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lookup(&self, name: &str) -> FakeRepo {
        self.repos
            .lock()
            .ok()
            .and_then(|repos| repos.get(name).cloned())
            .unwrap_or_default()
    }

    fn network_call(&self, name: &str, signal: &ShutdownSignal) -> VcsResult<SyncOutcome> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let deadline = Instant::now() + self.delay;
        let mut result = None;
        while Instant::now() < deadline {
            if signal.is_requested() {
                result = Some(Err(VcsError::Cancelled));
                break;
            }
            std::thread::sleep(POLL_STEP.min(self.delay));
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.unwrap_or_else(|| {
            let repo = self.lookup(name);
            match repo.operation_error {
                Some(error) => Err(error),
                None => Ok(repo.outcome),
            }
        })
    }
}

impl VcsClient for FakeVcs {
    type Handle = String;

    fn open(&self, path: &Path) -> VcsResult<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.lookup(&name).open_error {
            Some(error) => Err(error),
            None => Ok(name),
        }
    }

    fn analyze(&self, name: &String) -> VcsResult<RepositoryAnalysis> {
        let repo = self.lookup(name);
        Ok(RepositoryAnalysis {
            branch: repo.branch,
            clean: repo.clean,
            remote: repo.remote,
        })
    }

    fn fetch(&self, name: &String, _remote: &str, signal: &ShutdownSignal) -> VcsResult<SyncOutcome> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.network_call(name, signal)
    }

    fn pull(&self, name: &String, _remote: &str, signal: &ShutdownSignal) -> VcsResult<SyncOutcome> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.network_call(name, signal)
    }
}

/// Create `<root>/<relative>/.git` for each entry
pub fn make_working_copies(root: &Path, relative: &[&str]) {
    for path in relative {
        fs::create_dir_all(root.join(path).join(".git")).expect("create working copy");
    }
}

/// Repository references that do not need to exist on disk
pub fn repository_refs(names: &[&str]) -> Vec<RepositoryRef> {
    names
        .iter()
        .map(|name| RepositoryRef::with_metadata(PathBuf::from("/fake").join(name), true))
        .collect()
}

/// Numbered repository names `repo-00`, `repo-01`, ...
pub fn numbered(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("repo-{:02}", i)).collect()
}
