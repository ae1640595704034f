//! Line-oriented run summary for plain mode

use std::fmt::Write as _;

use crate::core::strings::title_case;
use crate::core::styles::StyleRole;
use crate::core::time::format_duration;
use crate::pipeline::{RepositoryResult, RunConfig};
use crate::report::aggregator::{classify, AggregateReport, Classification, RunStats};

/// Results shown at each end of the condensed view
pub const CONDENSED_EDGE: usize = 5;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Status glyph for a result
pub fn status_icon(result: &RepositoryResult) -> &'static str {
    match classify(result) {
        Classification::Successful if result.is_dry_run() => "🔍",
        Classification::Successful => "✅",
        Classification::Skipped => "⊝",
        Classification::Failed => "❌",
    }
}

/// One result on one line
pub fn format_result_line(result: &RepositoryResult, colors: bool) -> String {
    let path = result.repository().path().display();
    match result.error() {
        Some(error) => {
            let role = match classify(result) {
                Classification::Skipped => StyleRole::Skipped,
                _ => StyleRole::Failure,
            };
            format!(
                "{} {} ({}): {}",
                status_icon(result),
                result.name(),
                path,
                role.paint(&error.to_string(), colors)
            )
        }
        None => format!(
            "{} {} ({}) [{}@{}] - {}",
            status_icon(result),
            StyleRole::Success.paint(result.name(), colors),
            path,
            result.branch(),
            result.remote(),
            StyleRole::Dim.paint(&format_duration(result.elapsed()), colors)
        ),
    }
}

/// The numeric summary line
pub fn format_summary_line(stats: &RunStats, colors: bool) -> String {
    format!(
        "📈 Summary: {} successful, {} failed, {} skipped, {} total",
        StyleRole::Success.paint(&stats.successful.to_string(), colors),
        StyleRole::Failure.paint(&stats.failed.to_string(), colors),
        StyleRole::Skipped.paint(&stats.skipped.to_string(), colors),
        stats.total
    )
}

/// Render the summary block printed after a plain-mode run
pub fn render_summary(report: &AggregateReport, config: &RunConfig, colors: bool) -> String {
    let ordered = report.grouped();
    let condensed = !config.full_summary && ordered.len() > CONDENSED_EDGE * 2;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\n{}",
        StyleRole::Header.paint(
            &format!("📊 {} Results:", title_case(config.operation.name())),
            colors
        )
    );
    let _ = writeln!(out, "{}", RULE);

    if condensed {
        for result in &ordered[..CONDENSED_EDGE] {
            let _ = writeln!(out, "{}", format_result_line(result, colors));
        }
        let hidden = ordered.len() - CONDENSED_EDGE * 2;
        let _ = writeln!(
            out,
            "{}",
            StyleRole::Dim.paint(&format!("... ({} more repositories) ...", hidden), colors)
        );
        for result in &ordered[ordered.len() - CONDENSED_EDGE..] {
            let _ = writeln!(out, "{}", format_result_line(result, colors));
        }
    } else {
        for result in &ordered {
            let _ = writeln!(out, "{}", format_result_line(result, colors));
        }
    }

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", format_summary_line(&report.stats, colors));
    if let Some(reason) = report.outcome.cancelled {
        let _ = writeln!(
            out,
            "{}",
            StyleRole::Failure.paint(
                &format!(
                    "⚠️  Run {}: {} repositories were not started",
                    reason, report.outcome.not_admitted
                ),
                colors
            )
        );
    }
    if condensed {
        let _ = writeln!(
            out,
            "💡 Use --full-summary flag to see all {} repositories",
            ordered.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shutdown::CancelReason;
    use crate::pipeline::{ItemError, PipelineOutcome};
    use crate::report::aggregator::Aggregator;
    use crate::scanner::RepositoryRef;
    use crate::vcs::RepositoryAnalysis;
    use std::path::PathBuf;
    use std::time::Duration;

    fn result(name: &str, error: Option<ItemError>, dry_run: bool) -> RepositoryResult {
        let analysis = RepositoryAnalysis {
            branch: "main".to_string(),
            clean: true,
            remote: "origin".to_string(),
        };
        RepositoryResult::new(
            RepositoryRef::with_metadata(PathBuf::from(format!("/w/{}", name)), true),
            Some(&analysis),
            error,
            Duration::from_millis(1500),
            dry_run,
        )
    }

    fn report_of(results: Vec<RepositoryResult>) -> AggregateReport {
        let mut aggregator = Aggregator::new();
        for r in results {
            aggregator.record(r);
        }
        aggregator.into_report()
    }

    #[test]
    fn test_status_icons() {
        assert_eq!(status_icon(&result("a", None, false)), "✅");
        assert_eq!(status_icon(&result("a", None, true)), "🔍");
        assert_eq!(status_icon(&result("a", Some(ItemError::SkippedDirty), false)), "⊝");
        assert_eq!(
            status_icon(&result(
                "a",
                Some(ItemError::Cancelled(CancelReason::Interrupted)),
                false
            )),
            "⊝"
        );
        assert_eq!(
            status_icon(&result("a", Some(ItemError::Worker("x".to_string())), false)),
            "❌"
        );
    }

    #[test]
    fn test_success_line_layout() {
        let line = format_result_line(&result("alpha", None, false), false);
        assert_eq!(line, "✅ alpha (/w/alpha) [main@origin] - 1.5s");
    }

    #[test]
    fn test_skip_line_carries_reason() {
        let line = format_result_line(&result("beta", Some(ItemError::SkippedDirty), false), false);
        assert_eq!(
            line,
            "⊝ beta (/w/beta): repository has uncommitted changes (skipped)"
        );
    }

    #[test]
    fn test_small_run_lists_everything() {
        let results = (0..10).map(|i| result(&format!("r{}", i), None, false)).collect();
        let out = render_summary(&report_of(results), &RunConfig::default(), false);
        assert_eq!(out.matches("✅").count(), 10);
        assert!(!out.contains("more repositories"));
        assert!(!out.contains("--full-summary"));
        assert!(out.contains("📈 Summary: 10 successful, 0 failed, 0 skipped, 10 total"));
    }

    #[test]
    fn test_large_run_is_condensed() {
        let results = (0..13).map(|i| result(&format!("r{:02}", i), None, false)).collect();
        let out = render_summary(&report_of(results), &RunConfig::default(), false);
        assert_eq!(out.matches("✅").count(), 10);
        assert!(out.contains("... (3 more repositories) ..."));
        assert!(out.contains("r00") && out.contains("r04"));
        assert!(!out.contains("r05 ") && !out.contains("r07 "));
        assert!(out.contains("r08") && out.contains("r12"));
        assert!(out.contains("💡 Use --full-summary flag to see all 13 repositories"));
    }

    #[test]
    fn test_full_summary_disables_condensing() {
        let results = (0..13).map(|i| result(&format!("r{:02}", i), None, false)).collect();
        let config = RunConfig {
            full_summary: true,
            ..RunConfig::default()
        };
        let out = render_summary(&report_of(results), &config, false);
        assert_eq!(out.matches("✅").count(), 13);
        assert!(!out.contains("more repositories"));
    }

    #[test]
    fn test_failures_are_listed_first() {
        let results = vec![
            result("good", None, false),
            result("dirty", Some(ItemError::SkippedDirty), false),
            result("bad", Some(ItemError::Worker("boom".to_string())), false),
        ];
        let out = render_summary(&report_of(results), &RunConfig::default(), false);
        let bad = out.find("bad").unwrap();
        let dirty = out.find("dirty").unwrap();
        let good = out.find("good").unwrap();
        assert!(bad < dirty && dirty < good);
    }

    #[test]
    fn test_cancelled_run_is_flagged() {
        let mut report = report_of(vec![result("a", None, false)]);
        report.outcome = PipelineOutcome {
            cancelled: Some(CancelReason::TimedOut),
            admitted: 1,
            not_admitted: 4,
        };
        let out = render_summary(&report, &RunConfig::default(), false);
        assert!(out.contains("Run timed out: 4 repositories were not started"));
    }
}
