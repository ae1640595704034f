//! Working copy discovery
//!
//! Walks a directory tree and reports every directory that carries a `.git`
//! entry. The walk is depth-first in file-name order, prunes excluded
//! subtrees, and aborts on the first unreadable directory: an incomplete
//! repository set is worse than an explicit failure.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use walkdir::{DirEntry, WalkDir};

use crate::core::shutdown::{CancelReason, ShutdownSignal};
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::types::{RepositoryRef, ScanOptions, ScanProgress, GIT_METADATA_DIR};

/// A progress notification is offered after this many discoveries
pub const PROGRESS_INTERVAL: usize = 10;

fn is_git_metadata_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name() == GIT_METADATA_DIR
}

fn is_excluded(entry: &DirEntry, root: &Path, exclude: &[String]) -> bool {
    if entry.depth() == 0 || exclude.is_empty() {
        return false;
    }
    let Ok(relative) = entry.path().strip_prefix(root) else {
        return false;
    };
    let relative = relative.to_string_lossy();
    exclude
        .iter()
        .any(|pattern| !pattern.is_empty() && relative.contains(pattern.as_str()))
}

fn is_working_copy(path: &Path) -> bool {
    path.join(GIT_METADATA_DIR).symlink_metadata().is_ok()
}

/// Resolve the scan root to an absolute directory path
pub fn resolve_root(root: &Path) -> ScanResult<PathBuf> {
    let canonical = root.canonicalize().map_err(|_| ScanError::InvalidRoot {
        path: root.to_path_buf(),
    })?;
    if !canonical.is_dir() {
        return Err(ScanError::InvalidRoot { path: canonical });
    }
    Ok(canonical)
}

/// Discover working copies under `root` (blocking)
///
/// `progress` receives a [`ScanProgress`] every [`PROGRESS_INTERVAL`] finds.
/// Notifications are offered with `try_send` and dropped when the receiver
/// is full or gone.
pub fn discover(
    root: &Path,
    options: &ScanOptions,
    signal: &ShutdownSignal,
    progress: Option<&mpsc::Sender<ScanProgress>>,
) -> ScanResult<Vec<RepositoryRef>> {
    let root = resolve_root(root)?;
    log::info!("Scanning for Git repositories in {}", root.display());

    let mut repositories = Vec::new();
    let mut walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.file_type().is_dir()
                && !is_git_metadata_dir(entry)
                && !is_excluded(entry, &root, &options.exclude)
        });

    loop {
        if signal.is_requested() {
            log::debug!("Aborting discovery after {} repositories", repositories.len());
            let reason = signal.reason().unwrap_or(CancelReason::Interrupted);
            return Err(ScanError::Cancelled(reason));
        }

        let entry = match walker.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(err)) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                log::warn!("Failed to visit directory: {}", path.display());
                return Err(ScanError::Io {
                    path,
                    message: err.to_string(),
                });
            }
        };

        if !is_working_copy(entry.path()) {
            continue;
        }

        let repository = RepositoryRef::with_metadata(entry.path().to_path_buf(), true);
        log::debug!("Found working copy {}", repository.path().display());
        repositories.push(repository);

        if repositories.len() % PROGRESS_INTERVAL == 0 {
            log::info!("Found {} repositories so far...", repositories.len());
            if let Some(tx) = progress {
                // A slow consumer only loses notifications
                let _ = tx.try_send(ScanProgress {
                    found: repositories.len(),
                    current: entry.path().to_path_buf(),
                });
            }
        }

        if !options.recursive {
            walker.skip_current_dir();
        }
    }

    log::info!("Scan complete: found {} Git repositories", repositories.len());
    Ok(repositories)
}

/// Run [`discover`] on the blocking pool
pub async fn discover_async(
    root: PathBuf,
    options: ScanOptions,
    signal: ShutdownSignal,
    progress: Option<mpsc::Sender<ScanProgress>>,
) -> ScanResult<Vec<RepositoryRef>> {
    let fallback_path = root.clone();
    tokio::task::spawn_blocking(move || discover(&root, &options, &signal, progress.as_ref()))
        .await
        .map_err(|e| ScanError::Io {
            path: fallback_path,
            message: format!("Scan task failed: {}", e),
        })?
}
