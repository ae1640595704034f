//! Bounded concurrent dispatch
//!
//! Items are admitted in discovery order while a semaphore permit is free.
//! Each admitted item runs the [`ItemProcessor`] on the blocking pool and
//! reports through a bounded channel, so a slow consumer throttles the
//! workers instead of growing a queue. Every input item yields exactly one
//! [`PipelineEvent::Completed`], followed by one [`PipelineEvent::Done`].

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use crate::core::shutdown::{CancelReason, ShutdownSignal};
use crate::pipeline::processor::ItemProcessor;
use crate::pipeline::types::{ItemError, RepositoryResult};
use crate::scanner::RepositoryRef;
use crate::vcs::VcsClient;

/// Stream of pipeline notifications
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// One repository finished (in any order)
    Completed(RepositoryResult),
    /// Terminal event, sent once after the last completion
    Done(PipelineOutcome),
}

/// Summary of how dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineOutcome {
    /// Set when cancellation or the deadline fired during the run
    pub cancelled: Option<CancelReason>,
    /// Items handed to a worker
    pub admitted: usize,
    /// Items reported as cancelled without being processed
    pub not_admitted: usize,
}

impl PipelineOutcome {
    pub fn total(&self) -> usize {
        self.admitted + self.not_admitted
    }
}

/// Consumer side of a running pipeline
pub struct PipelineHandle {
    pub events: mpsc::Receiver<PipelineEvent>,
    pub task: JoinHandle<PipelineOutcome>,
}

pub struct Pipeline;

impl Pipeline {
    /// Start dispatching `items`; must be called inside a tokio runtime
    pub fn spawn<V: VcsClient>(
        items: Vec<RepositoryRef>,
        processor: ItemProcessor<V>,
        signal: ShutdownSignal,
    ) -> PipelineHandle {
        let workers = processor.config().workers.max(1);
        let (tx, events) = mpsc::channel(workers);
        let task = tokio::spawn(dispatch(items, processor, signal, tx, workers));
        PipelineHandle { events, task }
    }
}

async fn dispatch<V: VcsClient>(
    items: Vec<RepositoryRef>,
    processor: ItemProcessor<V>,
    signal: ShutdownSignal,
    tx: mpsc::Sender<PipelineEvent>,
    workers: usize,
) -> PipelineOutcome {
    log::info!(
        "Processing {} repositories with {} workers",
        items.len(),
        workers
    );

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut in_flight = JoinSet::new();
    let mut outcome = PipelineOutcome::default();
    let mut remaining = items.into_iter();

    while let Some(item) = remaining.next() {
        let permit = tokio::select! {
            biased;
            _ = signal.cancelled() => None,
            permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            let reason = signal.reason().unwrap_or(CancelReason::Interrupted);
            log::info!("Run {}, not starting remaining repositories", reason);
            outcome.cancelled = Some(reason);
            for skipped in std::iter::once(item).chain(remaining.by_ref()) {
                outcome.not_admitted += 1;
                let result = RepositoryResult::not_admitted(skipped, reason);
                // A closed receiver only means nobody is listening any more
                let _ = tx.send(PipelineEvent::Completed(result)).await;
            }
            break;
        };

        outcome.admitted += 1;
        let processor = processor.clone();
        let worker_signal = signal.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            let fallback = item.clone();
            let result =
                tokio::task::spawn_blocking(move || processor.process(item, &worker_signal))
                    .await
                    .unwrap_or_else(|e| {
                        log::error!("Worker for {} failed: {}", fallback.name(), e);
                        RepositoryResult::new(
                            fallback,
                            None,
                            Some(ItemError::Worker(e.to_string())),
                            Default::default(),
                            false,
                        )
                    });
            let _ = tx.send(PipelineEvent::Completed(result)).await;
            // Held until the result is delivered so a slow consumer throttles admission
            drop(permit);
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            log::error!("Pipeline worker task failed: {}", e);
        }
    }

    if outcome.cancelled.is_none() && signal.is_requested() {
        outcome.cancelled = signal.reason();
    }
    log::debug!(
        "Pipeline finished: admitted={} not_admitted={} cancelled={:?}",
        outcome.admitted,
        outcome.not_admitted,
        outcome.cancelled
    );
    let _ = tx.send(PipelineEvent::Done(outcome)).await;
    outcome
}
