//! Detailed run report written to a file

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use crate::core::time::{format_duration, format_timestamp};
use crate::pipeline::{RepositoryResult, RunConfig};
use crate::report::aggregator::AggregateReport;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl crate::core::error_handling::ContextualError for ReportError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// `Status:` value of one result
pub fn status_text(result: &RepositoryResult) -> String {
    match result.error() {
        None if result.is_dry_run() => "DRY RUN - Would have succeeded".to_string(),
        None => "SUCCESS".to_string(),
        Some(error) if error.is_skip() => format!("SKIPPED - {}", error),
        Some(error) => format!("FAILED - {}", error),
    }
}

/// Write the report body to any sink
pub fn render_report<W: Write>(
    out: &mut W,
    config: &RunConfig,
    report: &AggregateReport,
) -> std::io::Result<()> {
    let stats = &report.stats;
    writeln!(out, "git-herd Report - {}", format_timestamp(&Local::now()))?;
    writeln!(out, "Operation: {}", config.operation)?;
    writeln!(out, "Workers: {}", config.workers)?;
    writeln!(out, "Total Repositories: {}", stats.total)?;
    writeln!(
        out,
        "Successful: {}, Failed: {}, Skipped: {}",
        stats.successful, stats.failed, stats.skipped
    )?;
    if let Some(reason) = report.outcome.cancelled {
        writeln!(
            out,
            "Run {}: {} repositories not started",
            reason, report.outcome.not_admitted
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Repository Details:")?;
    writeln!(out, "==================")?;
    writeln!(out)?;

    for result in report.grouped() {
        writeln!(out, "Repository: {}", result.name())?;
        writeln!(out, "Path: {}", result.repository().path().display())?;
        if !result.branch().is_empty() {
            writeln!(out, "Branch: {}", result.branch())?;
        }
        if !result.remote().is_empty() {
            writeln!(out, "Remote: {}", result.remote())?;
        }
        writeln!(out, "Duration: {}", format_duration(result.elapsed()))?;
        writeln!(out, "Status: {}", status_text(result))?;
        writeln!(out)?;
    }
    Ok(())
}

/// Create or truncate `path` and write the report into it
pub fn write_report(
    path: &Path,
    config: &RunConfig,
    report: &AggregateReport,
) -> Result<(), ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut out = BufWriter::new(file);
    render_report(&mut out, config, report).map_err(io_error)?;
    out.flush().map_err(io_error)?;
    log::info!("Detailed report saved to {}", path.display());
    Ok(())
}
