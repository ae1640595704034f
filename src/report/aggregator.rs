//! Result classification and run statistics
//!
//! The aggregator is the single consumer of pipeline events. Counters live
//! here only, so no locking is needed and the totals can always be rebuilt
//! from the result list.

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use crate::pipeline::{PipelineEvent, PipelineOutcome, RepositoryResult};

/// Presentation bucket of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    Failed,
    Skipped,
    Successful,
}

/// Successful covers dry runs and "already up to date"
///
/// Dirty skips and items stopped by cancellation were never attempted to
/// completion, so both land in `Skipped`. The run-level cancellation lives in
/// [`PipelineOutcome::cancelled`].
pub fn classify(result: &RepositoryResult) -> Classification {
    match result.error() {
        None => Classification::Successful,
        Some(e) if e.is_skip() => Classification::Skipped,
        Some(_) => Classification::Failed,
    }
}

/// Counts and timestamps for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started: DateTime<Local>,
    pub finished: Option<DateTime<Local>>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl RunStats {
    pub fn new(started: DateTime<Local>) -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            started,
            finished: None,
        }
    }

    /// Recompute counts from a result list
    pub fn from_results(
        results: &[RepositoryResult],
        started: DateTime<Local>,
        finished: Option<DateTime<Local>>,
    ) -> Self {
        let mut stats = Self::new(started);
        for result in results {
            stats.count(classify(result));
        }
        stats.finished = finished;
        stats
    }

    fn count(&mut self, class: Classification) {
        self.total += 1;
        match class {
            Classification::Successful => self.successful += 1,
            Classification::Skipped => self.skipped += 1,
            Classification::Failed => self.failed += 1,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.successful + self.failed + self.skipped == self.total
    }

    /// Wall time from start to finish, or to now while still running
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished.unwrap_or_else(Local::now) - self.started
    }
}

/// Everything a run produced, ready for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    /// In the order results were received
    pub results: Vec<RepositoryResult>,
    pub stats: RunStats,
    pub outcome: PipelineOutcome,
}

impl AggregateReport {
    /// Failed, then skipped, then successful; receive order within each group
    pub fn grouped(&self) -> Vec<&RepositoryResult> {
        let mut ordered: Vec<&RepositoryResult> = self.results.iter().collect();
        ordered.sort_by_key(|result| classify(result));
        ordered
    }

    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }
}

/// Accumulates completed results in receive order
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    results: Vec<RepositoryResult>,
    stats: RunStats,
    outcome: Option<PipelineOutcome>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: RepositoryResult) -> Classification {
        let class = classify(&result);
        self.stats.count(class);
        self.results.push(result);
        class
    }

    /// Record the terminal event. Later calls are ignored.
    pub fn finish(&mut self, outcome: PipelineOutcome) {
        if self.outcome.is_some() {
            log::warn!("Ignoring duplicate pipeline completion");
            return;
        }
        self.stats.finished = Some(Local::now());
        self.outcome = Some(outcome);
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn results(&self) -> &[RepositoryResult] {
        &self.results
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn into_report(mut self) -> AggregateReport {
        if self.stats.finished.is_none() {
            self.stats.finished = Some(Local::now());
        }
        AggregateReport {
            results: self.results,
            stats: self.stats,
            outcome: self.outcome.unwrap_or_default(),
        }
    }

    /// Drain `events` until the terminal event and build the report
    pub async fn consume(mut self, events: &mut mpsc::Receiver<PipelineEvent>) -> AggregateReport {
        while let Some(event) = events.recv().await {
            match event {
                PipelineEvent::Completed(result) => {
                    let class = self.record(result);
                    log::debug!("Recorded result #{} as {:?}", self.stats.total, class);
                }
                PipelineEvent::Done(outcome) => {
                    self.finish(outcome);
                    break;
                }
            }
        }
        if !self.is_finished() {
            log::warn!("Pipeline closed without a completion event");
        }
        self.into_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shutdown::CancelReason;
    use crate::pipeline::{ItemError, OperationKind};
    use crate::scanner::RepositoryRef;
    use crate::vcs::{RepositoryAnalysis, VcsError};
    use std::path::PathBuf;
    use std::time::Duration;

    fn result(name: &str, error: Option<ItemError>) -> RepositoryResult {
        let analysis = RepositoryAnalysis {
            branch: "main".to_string(),
            clean: true,
            remote: "origin".to_string(),
        };
        RepositoryResult::new(
            RepositoryRef::with_metadata(PathBuf::from(format!("/w/{}", name)), true),
            Some(&analysis),
            error,
            Duration::from_millis(10),
            false,
        )
    }

    fn failed(name: &str) -> RepositoryResult {
        result(
            name,
            Some(ItemError::Operation {
                operation: OperationKind::Fetch,
                source: VcsError::NoRemote,
            }),
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&result("a", None)), Classification::Successful);
        assert_eq!(
            classify(&result("b", Some(ItemError::SkippedDirty))),
            Classification::Skipped
        );
        assert_eq!(classify(&failed("c")), Classification::Failed);
        assert_eq!(
            classify(&result("d", Some(ItemError::Cancelled(CancelReason::TimedOut)))),
            Classification::Skipped
        );
        assert_eq!(
            classify(&result("e", Some(ItemError::Worker("panicked".to_string())))),
            Classification::Failed
        );
    }

    #[test]
    fn test_record_keeps_counts_balanced() {
        let mut aggregator = Aggregator::new();
        aggregator.record(result("a", None));
        aggregator.record(result("b", Some(ItemError::SkippedDirty)));
        aggregator.record(failed("c"));
        aggregator.record(result("d", None));

        let stats = aggregator.stats();
        assert_eq!(
            (stats.total, stats.successful, stats.skipped, stats.failed),
            (4, 2, 1, 1)
        );
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_from_results_matches_incremental_counts() {
        let mut aggregator = Aggregator::new();
        for r in [result("a", None), failed("b"), result("c", Some(ItemError::SkippedDirty))] {
            aggregator.record(r);
        }
        let rebuilt = RunStats::from_results(
            aggregator.results(),
            aggregator.stats().started,
            aggregator.stats().finished,
        );
        assert_eq!(&rebuilt, aggregator.stats());
    }

    #[test]
    fn test_grouped_orders_without_mutating_results() {
        let mut aggregator = Aggregator::new();
        aggregator.record(result("ok-1", None));
        aggregator.record(failed("bad-1"));
        aggregator.record(result("skip", Some(ItemError::SkippedDirty)));
        aggregator.record(result("ok-2", None));
        aggregator.record(failed("bad-2"));
        let report = aggregator.into_report();

        let grouped: Vec<_> = report.grouped().iter().map(|r| r.name()).collect();
        assert_eq!(grouped, vec!["bad-1", "bad-2", "skip", "ok-1", "ok-2"]);
        let received: Vec<_> = report.results.iter().map(|r| r.name()).collect();
        assert_eq!(received, vec!["ok-1", "bad-1", "skip", "ok-2", "bad-2"]);
    }

    #[test]
    fn test_finish_is_recorded_once() {
        let mut aggregator = Aggregator::new();
        let first = PipelineOutcome {
            cancelled: Some(CancelReason::Interrupted),
            admitted: 1,
            not_admitted: 2,
        };
        aggregator.finish(first);
        aggregator.finish(PipelineOutcome::default());
        assert_eq!(aggregator.into_report().outcome, first);
    }

    #[tokio::test]
    async fn test_consume_stops_at_done() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(PipelineEvent::Completed(result("a", None))).await.unwrap();
        tx.send(PipelineEvent::Completed(failed("b"))).await.unwrap();
        tx.send(PipelineEvent::Done(PipelineOutcome {
            cancelled: None,
            admitted: 2,
            not_admitted: 0,
        }))
        .await
        .unwrap();
        drop(tx);

        let report = Aggregator::new().consume(&mut rx).await;
        assert_eq!(report.stats.total, 2);
        assert_eq!(report.outcome.admitted, 2);
        assert!(report.has_failures());
        assert!(report.stats.finished.is_some());
    }
}
