//! Command line arguments
//!
//! Every option is optional at this layer: an unset flag lets the
//! configuration file or the built-in default decide.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::validation::{parse_duration, split_and_collect, validate_positive_int};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "git-herd")]
#[command(about = "Bulk fetch or pull for every git working copy under a directory")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Directory to scan for repositories [default: .]
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Operation to perform on each repository
    #[arg(short = 'o', long = "operation", value_name = "OP", value_parser = ["fetch", "pull"])]
    pub operation: Option<String>,

    /// Number of repositories processed concurrently [default: 5]
    #[arg(short = 'w', long = "workers", value_name = "N", value_parser = validate_positive_int)]
    pub workers: Option<usize>,

    /// Show what would be done without touching any repository
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Descend into working copies to find nested ones [default: true]
    #[arg(
        short = 'r',
        long = "recursive",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub recursive: Option<bool>,

    /// Skip repositories with uncommitted changes [default: true]
    #[arg(
        short = 's',
        long = "skip-dirty",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub skip_dirty: Option<bool>,

    /// Debug logging with plain output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Plain line output instead of the live progress display
    #[arg(short = 'p', long = "plain")]
    pub plain: bool,

    /// List every repository in the summary
    #[arg(short = 'f', long = "full-summary")]
    pub full_summary: bool,

    /// Write a detailed report to FILE
    #[arg(long = "save-report", value_name = "FILE")]
    pub save_report: Option<PathBuf>,

    /// Overall timeout, e.g. 30s, 5m, 1h or 0 for none [default: 5m]
    #[arg(short = 't', long = "timeout", value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Path fragments to exclude from the scan*
    #[arg(short = 'e', long = "exclude", value_name = "LIST", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", overrides_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", overrides_with = "color")]
    pub no_color: bool,

    /// Log level
    #[arg(long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// `Some(true)` for `--color`, `Some(false)` for `--no-color`, `None` when unset
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Exclusion fragments with comma lists split and duplicates removed
    pub fn exclude_list(&self) -> Vec<String> {
        split_and_collect(&self.exclude, |s| s.clone())
    }

    /// Log file with the `none` and `-` magic values resolved
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.log_file.clone().filter(|path| {
            let text = path.to_string_lossy();
            !(text.eq_ignore_ascii_case("none") || text == "-")
        })
    }
}
