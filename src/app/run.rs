//! Run orchestration shared by both output modes

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{RunError, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS};
use crate::core::error_handling::log_error_with_context;
use crate::core::shutdown::{CancelReason, ShutdownSignal};
use crate::pipeline::{ItemProcessor, OutputMode, Pipeline, PipelineEvent, RunConfig};
use crate::report::plain::{format_result_line, render_summary};
use crate::report::{classify, write_report, AggregateReport, Aggregator, Classification};
use crate::scanner::{discover_async, ScanOptions};
use crate::ui::run_interactive;
use crate::vcs::VcsClient;

/// Everything a finished run hands back to the caller
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Present once dispatch started
    pub report: Option<AggregateReport>,
    pub error: Option<RunError>,
    /// The user asked to stop
    pub interrupted: bool,
}

impl RunOutcome {
    /// Process exit status for this run
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            return EXIT_INTERRUPTED;
        }
        if let Some(error) = &self.error {
            return error.exit_code();
        }
        match &self.report {
            Some(report) => match report.outcome.cancelled {
                Some(CancelReason::Interrupted) => EXIT_INTERRUPTED,
                Some(CancelReason::TimedOut) => EXIT_FAILURE,
                None if report.has_failures() => EXIT_FAILURE,
                None => EXIT_SUCCESS,
            },
            None => EXIT_SUCCESS,
        }
    }
}

/// Discover, process and aggregate with line-oriented output
pub async fn run_plain<V: VcsClient>(
    root: PathBuf,
    config: Arc<RunConfig>,
    client: Arc<V>,
    signal: ShutdownSignal,
) -> Result<Option<AggregateReport>, RunError> {
    log::info!(
        "Starting bulk {} in {} with {} workers",
        config.operation,
        root.display(),
        config.workers
    );

    let options = ScanOptions {
        recursive: config.recursive,
        exclude: config.exclude.clone(),
    };
    let repositories = discover_async(root, options, signal.clone(), None).await?;
    if repositories.is_empty() {
        log::info!("No Git repositories found");
        return Ok(None);
    }
    log::info!("Found {} repositories", repositories.len());

    let processor = ItemProcessor::new(Arc::clone(&config), client);
    let mut handle = Pipeline::spawn(repositories, processor, signal);
    let mut aggregator = Aggregator::new();

    while let Some(event) = handle.events.recv().await {
        match event {
            PipelineEvent::Completed(result) => {
                let line = format_result_line(&result, false);
                match classify(&result) {
                    Classification::Failed => log::warn!("{}", line),
                    _ => log::info!("{}", line),
                }
                aggregator.record(result);
            }
            PipelineEvent::Done(outcome) => {
                aggregator.finish(outcome);
                break;
            }
        }
    }

    match handle.task.await {
        Ok(outcome) if !aggregator.is_finished() => aggregator.finish(outcome),
        Ok(_) => {}
        Err(e) => return Err(RunError::Runtime(format!("Pipeline task failed: {}", e))),
    }
    Ok(Some(aggregator.into_report()))
}

/// Run with the configured output mode, then print the summary and save the report
pub async fn execute<V: VcsClient>(
    root: PathBuf,
    config: Arc<RunConfig>,
    client: Arc<V>,
    signal: ShutdownSignal,
    colors: bool,
) -> RunOutcome {
    let timeout_task = config.timeout.map(|timeout| signal.arm_timeout(timeout));

    let mut outcome = match config.output_mode {
        OutputMode::Plain => {
            match run_plain(root, Arc::clone(&config), client, signal.clone()).await {
                Ok(report) => RunOutcome {
                    report,
                    ..Default::default()
                },
                Err(error) => RunOutcome {
                    error: Some(error),
                    ..Default::default()
                },
            }
        }
        OutputMode::Interactive => {
            let interactive =
                run_interactive(root, Arc::clone(&config), client, signal.clone(), colors).await;
            RunOutcome {
                report: interactive.report,
                error: interactive.error,
                interrupted: interactive.quit,
            }
        }
    };

    if let Some(task) = timeout_task {
        task.abort();
    }
    if signal.reason() == Some(CancelReason::Interrupted) {
        outcome.interrupted = true;
    }

    if let Some(error) = &outcome.error {
        log_error_with_context(error, "Run failed");
    }

    if let Some(report) = &outcome.report {
        print!("{}", render_summary(report, &config, colors));
        if let Some(path) = &config.report_path {
            match write_report(path, &config, report) {
                Ok(()) => println!("📄 Detailed report saved to: {}", path.display()),
                Err(e) => log_error_with_context(&e, "Failed to save report"),
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ItemError, PipelineOutcome, RepositoryResult};
    use crate::scanner::{RepositoryRef, ScanError};
    use crate::vcs::RepositoryAnalysis;
    use std::time::Duration;

    fn report(errors: Vec<Option<ItemError>>, cancelled: Option<CancelReason>) -> AggregateReport {
        let mut aggregator = Aggregator::new();
        let analysis = RepositoryAnalysis {
            branch: "main".to_string(),
            clean: true,
            remote: "origin".to_string(),
        };
        for (i, error) in errors.into_iter().enumerate() {
            let repo = RepositoryRef::with_metadata(PathBuf::from(format!("/src/r{}", i)), true);
            aggregator.record(RepositoryResult::new(
                repo,
                Some(&analysis),
                error,
                Duration::from_millis(5),
                false,
            ));
        }
        aggregator.finish(PipelineOutcome {
            cancelled,
            ..Default::default()
        });
        aggregator.into_report()
    }

    #[test]
    fn test_success_and_skips_exit_zero() {
        let outcome = RunOutcome {
            report: Some(report(vec![None, Some(ItemError::SkippedDirty)], None)),
            ..Default::default()
        };
        assert_eq!(outcome.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_any_failure_exits_one() {
        let outcome = RunOutcome {
            report: Some(report(
                vec![None, Some(ItemError::Worker("panicked".to_string()))],
                None,
            )),
            ..Default::default()
        };
        assert_eq!(outcome.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_timeout_exits_one_and_interrupt_exits_130() {
        let timed_out = RunOutcome {
            report: Some(report(vec![None], Some(CancelReason::TimedOut))),
            ..Default::default()
        };
        assert_eq!(timed_out.exit_code(), EXIT_FAILURE);

        let interrupted = RunOutcome {
            report: Some(report(vec![None], Some(CancelReason::Interrupted))),
            ..Default::default()
        };
        assert_eq!(interrupted.exit_code(), EXIT_INTERRUPTED);
    }

    #[test]
    fn test_discovery_error_exits_one() {
        let outcome = RunOutcome {
            error: Some(RunError::from(ScanError::InvalidRoot {
                path: PathBuf::from("/missing"),
            })),
            ..Default::default()
        };
        assert_eq!(outcome.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_nothing_found_exits_zero() {
        assert_eq!(RunOutcome::default().exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_user_quit_wins_over_everything() {
        let outcome = RunOutcome {
            report: Some(report(vec![Some(ItemError::Worker("x".to_string()))], None)),
            error: None,
            interrupted: true,
        };
        assert_eq!(outcome.exit_code(), EXIT_INTERRUPTED);
    }
}
