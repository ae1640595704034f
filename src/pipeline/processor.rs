//! Per-repository work unit
//!
//! Each step short-circuits: a failed analysis never reaches the dirty
//! check, a skipped or dry-run item never touches the network.

use std::sync::Arc;
use std::time::Instant;

use crate::core::shutdown::{CancelReason, ShutdownSignal};
use crate::pipeline::types::{AnalysisStep, ItemError, OperationKind, RepositoryResult, RunConfig};
use crate::scanner::RepositoryRef;
use crate::vcs::{RepositoryAnalysis, SyncOutcome, VcsClient, VcsError};

/// Turns one [`RepositoryRef`] into one [`RepositoryResult`]
///
/// Holds only the shared configuration and client, so a single instance
/// serves every worker.
pub struct ItemProcessor<V: VcsClient> {
    config: Arc<RunConfig>,
    client: Arc<V>,
}

impl<V: VcsClient> Clone for ItemProcessor<V> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            client: Arc::clone(&self.client),
        }
    }
}

impl<V: VcsClient> ItemProcessor<V> {
    pub fn new(config: Arc<RunConfig>, client: Arc<V>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Process one repository (blocking)
    pub fn process(&self, repository: RepositoryRef, signal: &ShutdownSignal) -> RepositoryResult {
        let started = Instant::now();
        let mut analysis = None;
        let error = self.run_steps(&repository, signal, &mut analysis).err();

        match &error {
            None => log::debug!("{}: done", repository.name()),
            // Consumers report each result; keep worker-side lines at debug
            Some(e) => log::debug!("{}: {}", repository.name(), e),
        }

        RepositoryResult::new(
            repository,
            analysis.as_ref(),
            error,
            started.elapsed(),
            self.config.dry_run,
        )
    }

    fn run_steps(
        &self,
        repository: &RepositoryRef,
        signal: &ShutdownSignal,
        analysis_out: &mut Option<RepositoryAnalysis>,
    ) -> Result<(), ItemError> {
        let cancelled = |e: &VcsError| {
            e.is_cancelled()
                .then(|| ItemError::Cancelled(signal.reason().unwrap_or(CancelReason::Interrupted)))
        };

        let handle = self.client.open(repository.path()).map_err(|source| {
            cancelled(&source).unwrap_or(ItemError::Analysis {
                step: AnalysisStep::Open,
                source,
            })
        })?;
        let analysis = self.client.analyze(&handle).map_err(|source| {
            cancelled(&source).unwrap_or(ItemError::Analysis {
                step: AnalysisStep::Inspect,
                source,
            })
        })?;
        log::debug!(
            "{}: branch={} clean={} remote={}",
            repository.name(),
            analysis.branch,
            analysis.clean,
            analysis.remote
        );
        let remote = analysis.remote.clone();
        let clean = analysis.clean;
        *analysis_out = Some(analysis);

        if self.config.skip_dirty && !clean {
            return Err(ItemError::SkippedDirty);
        }
        if self.config.dry_run {
            log::info!(
                "{}: would {} from '{}'",
                repository.name(),
                self.config.operation,
                remote
            );
            return Ok(());
        }

        let operation = self.config.operation;
        let outcome = match operation {
            OperationKind::Fetch => self.client.fetch(&handle, &remote, signal),
            OperationKind::Pull => self.client.pull(&handle, &remote, signal),
        }
        .map_err(|source| cancelled(&source).unwrap_or(ItemError::Operation { operation, source }))?;

        if outcome == SyncOutcome::NoChange {
            log::debug!("{}: already up to date", repository.name());
        }
        Ok(())
    }
}
