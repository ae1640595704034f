//! TOML configuration file loading and settings layering
//!
//! Settings are resolved in three layers: built-in defaults, then the
//! configuration file, then the command line. Keys in the file use the
//! long flag names (`workers`, `skip-dirty`, `save-report`, ...).

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::args::Args;
use crate::core::error_handling::ContextualError;
use crate::core::validation::{parse_duration, split_and_collect, ValidationError};
use crate::pipeline::{OperationKind, OutputMode, RunConfig};

/// File name looked up in the working directory and the config directory
pub const CONFIG_FILE_NAME: &str = "git-herd.toml";
/// Sub-directory of the platform config directory
pub const CONFIG_DIR_NAME: &str = "git-herd";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["text", "ext", "json"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Error parsing configuration file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Error in configuration file {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Invalid argument: {0}")]
    Argument(#[from] ValidationError),
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// Find the configuration file to load, if any
///
/// An explicit path must exist. Otherwise `git-herd.toml` in `working_dir`
/// wins over `<config_dir>/git-herd/git-herd.toml`; neither is required.
pub fn locate_config_file(
    explicit: Option<&Path>,
    working_dir: &Path,
    config_dir: Option<&Path>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = working_dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    Ok(config_dir
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file()))
}

/// Read and parse a configuration file into a raw table
pub fn load_config_file(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str::<toml::Table>(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory to scan, as given (resolved later by the scanner)
    pub root: PathBuf,
    pub run: RunConfig,
    pub plain: bool,
    /// `None` follows the terminal
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    /// Configuration file that was applied, if any
    pub config_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            run: RunConfig::default(),
            plain: false,
            color: None,
            log_level: None,
            log_format: None,
            log_file: None,
            config_file: None,
        }
    }
}

fn get_bool(config: &toml::Table, key: &str) -> Result<Option<bool>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| ValidationError::new(&format!("'{}' must be true or false", key))),
    }
}

fn get_str<'a>(config: &'a toml::Table, key: &str) -> Result<Option<&'a str>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| ValidationError::new(&format!("'{}' must be a string", key))),
    }
}

fn get_choice<'a>(
    config: &'a toml::Table,
    key: &str,
    choices: &[&str],
) -> Result<Option<&'a str>, ValidationError> {
    match get_str(config, key)? {
        Some(value) if !choices.contains(&value) => Err(ValidationError::new(&format!(
            "Invalid {} '{}': expected one of {}",
            key,
            value,
            choices.join(", ")
        ))),
        other => Ok(other),
    }
}

/// Accept a single string or an array of strings, each possibly comma-separated
fn get_string_list(config: &toml::Table, key: &str) -> Result<Option<Vec<String>>, ValidationError> {
    let Some(value) = config.get(key) else {
        return Ok(None);
    };
    let mut items = Vec::new();
    if let Some(single) = value.as_str() {
        items.push(single.to_string());
    } else if let Some(array) = value.as_array() {
        for item in array {
            let text = item.as_str().ok_or_else(|| {
                ValidationError::new(&format!("'{}' entries must be strings", key))
            })?;
            items.push(text.to_string());
        }
    } else {
        return Err(ValidationError::new(&format!(
            "'{}' must be a string or an array of strings",
            key
        )));
    }
    Ok(Some(split_and_collect(&items, |s| s.clone())))
}

fn timeout_from(duration: std::time::Duration) -> Option<std::time::Duration> {
    (!duration.is_zero()).then_some(duration)
}

fn optional_path(value: &str) -> Option<PathBuf> {
    (!value.trim().is_empty()).then(|| PathBuf::from(value))
}

impl Settings {
    /// Apply values from a parsed configuration file
    pub fn apply_toml_values(&mut self, config: &toml::Table) -> Result<(), ValidationError> {
        if let Some(path) = get_str(config, "path")? {
            self.root = PathBuf::from(path);
        }
        if let Some(name) = get_str(config, "operation")? {
            self.run.operation = OperationKind::from_name(name).ok_or_else(|| {
                ValidationError::new(&format!(
                    "Invalid operation '{}': expected {}",
                    name,
                    OperationKind::names().collect::<Vec<_>>().join(" or ")
                ))
            })?;
        }
        if let Some(value) = config.get("workers") {
            let workers = value
                .as_integer()
                .filter(|n| *n >= 1)
                .ok_or_else(|| ValidationError::new("'workers' must be an integer of at least 1"))?;
            self.run.workers = usize::try_from(workers)
                .map_err(|_| ValidationError::new("'workers' is out of range"))?;
        }
        if let Some(value) = config.get("timeout") {
            let timeout = if let Some(secs) = value.as_integer() {
                let secs = u64::try_from(secs)
                    .map_err(|_| ValidationError::new("'timeout' cannot be negative"))?;
                std::time::Duration::from_secs(secs)
            } else if let Some(text) = value.as_str() {
                parse_duration(text)?
            } else {
                return Err(ValidationError::new(
                    "'timeout' must be a duration string or a number of seconds",
                ));
            };
            self.run.timeout = timeout_from(timeout);
        }
        if let Some(exclude) = get_string_list(config, "exclude")? {
            // A configured list replaces the defaults
            self.run.exclude = exclude;
        }

        if let Some(v) = get_bool(config, "dry-run")? {
            self.run.dry_run = v;
        }
        if let Some(v) = get_bool(config, "recursive")? {
            self.run.recursive = v;
        }
        if let Some(v) = get_bool(config, "skip-dirty")? {
            self.run.skip_dirty = v;
        }
        if let Some(v) = get_bool(config, "verbose")? {
            self.run.verbose = v;
        }
        if let Some(v) = get_bool(config, "plain")? {
            self.plain = v;
        }
        if let Some(v) = get_bool(config, "full-summary")? {
            self.run.full_summary = v;
        }
        if let Some(report) = get_str(config, "save-report")? {
            self.run.report_path = optional_path(report);
        }

        if let Some(color) = get_bool(config, "color")? {
            self.color = Some(color);
        }
        if let Some(no_color) = get_bool(config, "no-color")? {
            self.color = Some(!no_color);
        }
        if let Some(level) = get_choice(config, "log-level", LOG_LEVELS)? {
            self.log_level = Some(level.to_string());
        }
        if let Some(format) = get_choice(config, "log-format", LOG_FORMATS)? {
            self.log_format = Some(format.to_string());
        }
        if let Some(log_file) = get_str(config, "log-file")? {
            if log_file.eq_ignore_ascii_case("none") || log_file == "-" {
                self.log_file = None;
            } else {
                self.log_file = optional_path(log_file);
            }
        }
        Ok(())
    }

    /// Apply command line values; anything given on the command line wins
    pub fn apply_args(&mut self, args: &Args) -> Result<(), ValidationError> {
        if let Some(path) = &args.path {
            self.root = path.clone();
        }
        if let Some(name) = &args.operation {
            self.run.operation = OperationKind::from_name(name)
                .ok_or_else(|| ValidationError::new(&format!("Invalid operation '{}'", name)))?;
        }
        if let Some(workers) = args.workers {
            if workers == 0 {
                return Err(ValidationError::new("Value must be greater than 0"));
            }
            self.run.workers = workers;
        }
        if let Some(timeout) = args.timeout {
            self.run.timeout = timeout_from(timeout);
        }
        if !args.exclude.is_empty() {
            self.run.exclude = args.exclude_list();
        }
        if let Some(recursive) = args.recursive {
            self.run.recursive = recursive;
        }
        if let Some(skip_dirty) = args.skip_dirty {
            self.run.skip_dirty = skip_dirty;
        }

        // Plain switches can only turn a feature on
        self.run.dry_run |= args.dry_run;
        self.run.verbose |= args.verbose;
        self.run.full_summary |= args.full_summary;
        self.plain |= args.plain;

        if let Some(report) = &args.save_report {
            self.run.report_path = Some(report.clone());
        }
        if let Some(color) = args.color_override() {
            self.color = Some(color);
        }
        if let Some(level) = &args.log_level {
            self.log_level = Some(level.clone());
        }
        if let Some(format) = &args.log_format {
            self.log_format = Some(format.clone());
        }
        if args.log_file.is_some() {
            self.log_file = args.log_file_path();
        }
        Ok(())
    }

    /// Pick the output mode: the live display needs a terminal and no plain or verbose request
    pub fn select_output_mode(&mut self, stdout_is_terminal: bool) {
        self.run.output_mode = if self.plain || self.run.verbose || !stdout_is_terminal {
            OutputMode::Plain
        } else {
            OutputMode::Interactive
        };
    }

    /// Log level after verbose and output mode are taken into account
    pub fn effective_log_level(&self) -> &str {
        if self.run.verbose {
            return "debug";
        }
        match (&self.log_level, self.run.output_mode, &self.log_file) {
            (Some(level), _, _) => level,
            // Only errors may reach stderr under the live display
            (None, OutputMode::Interactive, None) => "error",
            (None, OutputMode::Interactive, Some(_)) => "warn",
            (None, OutputMode::Plain, _) => "info",
        }
    }

    pub fn use_color(&self, stdout_is_terminal: bool) -> bool {
        self.color
            .unwrap_or_else(|| stdout_is_terminal && std::env::var_os("NO_COLOR").is_none())
    }
}

/// Resolve settings from defaults, the configuration file and the command line
pub fn resolve_settings(
    args: &Args,
    working_dir: &Path,
    config_dir: Option<&Path>,
    stdout_is_terminal: bool,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Some(path) = locate_config_file(args.config_file.as_deref(), working_dir, config_dir)? {
        log::debug!("Loading configuration from {}", path.display());
        let table = load_config_file(&path)?;
        settings
            .apply_toml_values(&table)
            .map_err(|source| ConfigError::Invalid {
                path: path.clone(),
                source,
            })?;
        settings.config_file = Some(path);
    }

    settings.apply_args(args)?;
    settings.select_output_mode(stdout_is_terminal);
    Ok(settings)
}
