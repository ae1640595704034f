//! gix-backed [`VcsClient`]
//!
//! Inspection and fetching run in-process through gix. Fast-forwarding the
//! working copy shells out to `git merge --ff-only`, which owns the checkout
//! and refuses anything that is not a fast-forward.

use std::fmt::Display;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::core::shutdown::ShutdownSignal;
use crate::vcs::client::VcsClient;
use crate::vcs::error::{VcsError, VcsResult};
use crate::vcs::types::{preferred_remote, RepositoryAnalysis, SyncOutcome, DETACHED_HEAD};

const MERGE_POLL_INTERVAL: Duration = Duration::from_millis(50);
const LOCAL_REMOTE: &str = ".";

/// Upstream tracking branch of the checked-out branch
#[derive(Debug, Clone, PartialEq, Eq)]
struct Upstream {
    remote: String,
    tracking_ref: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GixClient;

impl GixClient {
    pub fn new() -> Self {
        Self
    }
}

fn inspect_error(e: impl Display) -> VcsError {
    VcsError::Inspect {
        message: e.to_string(),
    }
}

fn current_branch(repo: &gix::Repository) -> VcsResult<Option<String>> {
    let name = repo.head_name().map_err(inspect_error)?;
    Ok(name.map(|name| name.shorten().to_string()))
}

/// Resolve `branch.<name>.remote` and `branch.<name>.merge` to a tracking ref
fn upstream_of(repo: &gix::Repository, branch: &str) -> VcsResult<Upstream> {
    let config = repo.config_snapshot();
    let remote = config.string(format!("branch.{}.remote", branch).as_str());
    let merge = config.string(format!("branch.{}.merge", branch).as_str());
    let (Some(remote), Some(merge)) = (remote, merge) else {
        return Err(VcsError::NoUpstream {
            branch: branch.to_string(),
        });
    };
    let remote = remote.to_string();
    let merge = merge.to_string();

    let tracking_ref = if remote == LOCAL_REMOTE {
        merge
    } else {
        let short = merge.strip_prefix("refs/heads/").unwrap_or(&merge);
        format!("refs/remotes/{}/{}", remote, short)
    };
    Ok(Upstream {
        remote,
        tracking_ref,
    })
}

fn fetch_from(
    repo: &gix::Repository,
    remote_name: &str,
    signal: &ShutdownSignal,
) -> VcsResult<SyncOutcome> {
    if remote_name.is_empty() {
        return Err(VcsError::NoRemote);
    }
    if signal.is_requested() {
        return Err(VcsError::Cancelled);
    }

    // gix reports interruption as an ordinary error; the flag tells them apart
    let network_error = |e: &dyn Display| {
        if signal.is_requested() {
            VcsError::Cancelled
        } else {
            VcsError::Network {
                remote: remote_name.to_string(),
                message: e.to_string(),
            }
        }
    };

    let remote = repo
        .find_remote(remote_name)
        .map_err(|e| network_error(&e))?;
    let connection = remote
        .connect(gix::remote::Direction::Fetch)
        .map_err(|e| network_error(&e))?;
    let outcome = connection
        .prepare_fetch(gix::progress::Discard, Default::default())
        .map_err(|e| network_error(&e))?
        .receive(gix::progress::Discard, signal.interrupt_flag())
        .map_err(|e| network_error(&e))?;

    match outcome.status {
        gix::remote::fetch::Status::NoPackReceived { .. } => {
            log::debug!("Remote '{}' had nothing new", remote_name);
            Ok(SyncOutcome::NoChange)
        }
        _ => Ok(SyncOutcome::Updated),
    }
}

/// Run git in `workdir`, killing it once the signal fires
fn run_git(workdir: &Path, args: &[&str], signal: &ShutdownSignal) -> VcsResult<()> {
    let merge_error = |e: &dyn Display| VcsError::Merge {
        message: e.to_string(),
    };

    log::debug!("Running git {} in {}", args.join(" "), workdir.display());
    let mut child = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| merge_error(&e))?;

    loop {
        if signal.is_requested() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VcsError::Cancelled);
        }
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => std::thread::sleep(MERGE_POLL_INTERVAL),
            Err(e) => return Err(merge_error(&e)),
        }
    }

    let output = child.wait_with_output().map_err(|e| merge_error(&e))?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("git exited with {}", output.status));
    Err(VcsError::Merge { message })
}

impl VcsClient for GixClient {
    type Handle = gix::Repository;

    fn open(&self, path: &Path) -> VcsResult<Self::Handle> {
        gix::open(path).map_err(|e| VcsError::NotARepository {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn analyze(&self, repo: &Self::Handle) -> VcsResult<RepositoryAnalysis> {
        let branch = current_branch(repo)?.unwrap_or_else(|| DETACHED_HEAD.to_string());
        let clean = !repo.is_dirty().map_err(inspect_error)?;
        let remote = preferred_remote(repo.remote_names().iter().map(|name| name.to_string()));

        Ok(RepositoryAnalysis {
            branch,
            clean,
            remote,
        })
    }

    fn fetch(
        &self,
        repo: &Self::Handle,
        remote: &str,
        signal: &ShutdownSignal,
    ) -> VcsResult<SyncOutcome> {
        fetch_from(repo, remote, signal)
    }

    fn pull(
        &self,
        repo: &Self::Handle,
        remote: &str,
        signal: &ShutdownSignal,
    ) -> VcsResult<SyncOutcome> {
        let branch = current_branch(repo)?.ok_or(VcsError::DetachedHead)?;
        let upstream = upstream_of(repo, &branch)?;

        // The branch's own remote wins over the repository default
        let fetched = if upstream.remote == LOCAL_REMOTE {
            SyncOutcome::NoChange
        } else if upstream.remote.is_empty() {
            fetch_from(repo, remote, signal)?
        } else {
            fetch_from(repo, &upstream.remote, signal)?
        };

        let head = repo.head_id().map_err(inspect_error)?.detach();
        let target = repo
            .rev_parse_single(upstream.tracking_ref.as_str())
            .map_err(|_| VcsError::NoUpstream {
                branch: branch.clone(),
            })?
            .detach();

        if head == target {
            return Ok(fetched);
        }
        let base = repo
            .merge_base(head, target)
            .map_err(|e| VcsError::Merge {
                message: e.to_string(),
            })?
            .detach();
        if base == target {
            // Local branch is ahead of its upstream
            return Ok(fetched);
        }

        let workdir = repo.workdir().ok_or_else(|| VcsError::Merge {
            message: "repository has no working tree".to_string(),
        })?;
        run_git(
            workdir,
            &["merge", "--ff-only", "--quiet", &upstream.tracking_ref],
            signal,
        )?;
        log::debug!("Fast-forwarded {} to {}", branch, upstream.tracking_ref);
        Ok(SyncOutcome::Updated)
    }
}
