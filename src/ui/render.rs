//! Pure rendering of a [`ProgressModel`] into terminal lines

use crate::core::strings::{title_case, truncate_to_width};
use crate::core::styles::StyleRole;
use crate::report::plain::{format_result_line, format_summary_line};
use crate::ui::model::{Phase, ProgressModel};

pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Results shown under the progress bar
pub const RECENT_RESULTS: usize = 3;

const BAR_WIDTH: usize = 40;

pub fn spinner_glyph(frame: usize) -> char {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// `[████░░░░]  50%`, with `width` cells between the brackets
pub fn progress_bar(done: usize, total: usize, width: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        (done.min(total) as f64) / (total as f64)
    };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!(
        "[{}{}] {:>3}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        (ratio * 100.0).round() as usize
    )
}

/// Lines for the current frame, each fitted to `width` columns
pub fn render(model: &ProgressModel, colors: bool, width: usize) -> Vec<String> {
    let config = model.config();
    let mut lines = Vec::new();

    let mut title = format!(
        "🚀 git-herd - {} Operation",
        title_case(config.operation.name())
    );
    if config.dry_run {
        title.push_str(" (dry run)");
    }
    lines.push(StyleRole::Header.paint(&title, colors));
    lines.push(String::new());

    let spinner = spinner_glyph(model.spinner_frame()).to_string();
    match model.phase() {
        Phase::Initializing => lines.push("Initializing...".to_string()),
        Phase::Scanning => {
            lines.push(format!(
                "{} Scanning for Git repositories in {}...",
                StyleRole::Info.paint(&spinner, colors),
                truncate_to_width(model.root(), width.saturating_sub(40).max(10))
            ));
            if model.discovered() > 0 {
                lines.push(format!("   Found {} so far", model.discovered()));
            }
        }
        Phase::Processing => {
            lines.push(format!(
                "{} Processing repositories ({}/{})",
                StyleRole::Info.paint(&spinner, colors),
                model.processed(),
                model.total()
            ));
            let bar_width = BAR_WIDTH.min(width.saturating_sub(8)).max(10);
            lines.push(StyleRole::Accent.paint(
                &progress_bar(model.processed(), model.total(), bar_width),
                colors,
            ));
            let recent: Vec<_> = model.recent(RECENT_RESULTS).collect();
            if !recent.is_empty() {
                lines.push(String::new());
                lines.push(StyleRole::Dim.paint("Recent:", colors));
                for result in recent {
                    // Fit before coloring so escape codes are not counted
                    let line = truncate_to_width(&format_result_line(result, false), width);
                    lines.push(line);
                }
            }
        }
        Phase::Complete => {
            if let Some(error) = model.error() {
                lines.push(StyleRole::Failure.paint(&format!("❌ Error: {}", error), colors));
            } else if model.total() == 0 {
                lines.push(StyleRole::Skipped.paint("No Git repositories found", colors));
            } else {
                lines.push(StyleRole::Success.paint("✅ Operation complete!", colors));
            }
            if model.total() > 0 {
                lines.push(format_summary_line(model.aggregator().stats(), colors));
            }
        }
        Phase::Cancelled => {
            lines.push(StyleRole::Failure.paint(
                &format!(
                    "⚠️  Operation cancelled ({}/{} processed)",
                    model.processed(),
                    model.total()
                ),
                colors,
            ));
        }
    }

    if !model.phase().is_terminal() {
        lines.push(String::new());
        lines.push(StyleRole::Dim.paint("Press q to quit", colors));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ItemError, RepositoryResult, RunConfig};
    use crate::scanner::RepositoryRef;
    use crate::ui::model::Message;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn repo(name: &str) -> RepositoryRef {
        RepositoryRef::with_metadata(PathBuf::from(format!("/w/{}", name)), true)
    }

    fn model() -> ProgressModel {
        ProgressModel::new(Arc::new(RunConfig::default()), "/w")
    }

    fn text(model: &ProgressModel) -> String {
        render(model, false, 100).join("\n")
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(spinner_glyph(0), '⠋');
        assert_eq!(spinner_glyph(SPINNER_FRAMES.len()), '⠋');
        assert_eq!(spinner_glyph(1), '⠙');
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 4, 4), "[░░░░]   0%");
        assert_eq!(progress_bar(2, 4, 4), "[██░░]  50%");
        assert_eq!(progress_bar(4, 4, 4), "[████] 100%");
        assert_eq!(progress_bar(0, 0, 4), "[████] 100%");
    }

    #[test]
    fn test_title_names_operation() {
        let lines = render(&model(), false, 80);
        assert_eq!(lines[0], "🚀 git-herd - Fetch Operation");
    }

    #[test]
    fn test_scanning_frame() {
        let mut m = model();
        m.update(Message::Start);
        m.update(Message::ScanProgress(10));
        let out = text(&m);
        assert!(out.contains("Scanning for Git repositories in /w..."));
        assert!(out.contains("Found 10 so far"));
        assert!(out.contains("Press q to quit"));
    }

    #[test]
    fn test_processing_frame_shows_last_three() {
        let mut m = model();
        m.update(Message::Start);
        m.update(Message::RepositoriesFound(
            (0..5).map(|i| repo(&format!("r{}", i))).collect(),
        ));
        for i in 0..4 {
            m.update(Message::RepoProcessed(RepositoryResult::new(
                repo(&format!("r{}", i)),
                None,
                None,
                Duration::ZERO,
                false,
            )));
        }
        let out = text(&m);
        assert!(out.contains("Processing repositories (4/5)"));
        assert!(out.contains(" 80%"));
        assert!(out.contains("r3") && out.contains("r2") && out.contains("r1"));
        assert!(!out.contains("r0"));
    }

    #[test]
    fn test_empty_run_frame() {
        let mut m = model();
        m.update(Message::Start);
        m.update(Message::RepositoriesFound(vec![]));
        let out = text(&m);
        assert!(out.contains("No Git repositories found"));
        assert!(!out.contains("Press q"));
    }

    #[test]
    fn test_complete_frame_has_summary() {
        let mut m = model();
        m.update(Message::Start);
        m.update(Message::RepositoriesFound(vec![repo("a")]));
        m.update(Message::RepoProcessed(RepositoryResult::new(
            repo("a"),
            None,
            Some(ItemError::SkippedDirty),
            Duration::ZERO,
            false,
        )));
        let out = text(&m);
        assert!(out.contains("✅ Operation complete!"));
        assert!(out.contains("0 successful, 0 failed, 1 skipped, 1 total"));
    }

    #[test]
    fn test_cancelled_frame_has_no_success_banner() {
        let mut m = model();
        m.update(Message::Start);
        m.update(Message::RepositoriesFound(vec![repo("a"), repo("b")]));
        m.update(Message::Quit);
        let out = text(&m);
        assert!(out.contains("Operation cancelled (0/2 processed)"));
        assert!(!out.contains("Operation complete"));
    }
}
