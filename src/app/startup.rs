//! Process entry: argument parsing, logging, configuration and the runtime

use std::io::IsTerminal;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches};

use super::cli::args::Args;
use super::cli::config::{resolve_settings, Settings};
use super::error::{RunError, EXIT_FAILURE, EXIT_SUCCESS};
use super::run::execute;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::styles::palette_to_clap;
use crate::vcs::GixClient;

fn parse_args() -> Result<Args, clap::Error> {
    let colors = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let matches = Args::command()
        .styles(palette_to_clap(colors))
        .try_get_matches()?;
    Args::from_arg_matches(&matches)
}

/// Run the application and return the process exit code
pub fn startup() -> i32 {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
                _ => EXIT_FAILURE,
            };
        }
    };
    let stdout_is_terminal = std::io::stdout().is_terminal();

    let working_dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
    let config_dir = dirs::config_dir();
    let settings = match resolve_settings(
        &args,
        &working_dir,
        config_dir.as_deref(),
        stdout_is_terminal,
    ) {
        Ok(settings) => settings,
        Err(e) => {
            // Logging is not up yet
            eprintln!("Error: {}", e);
            return RunError::from(e).exit_code();
        }
    };

    if let Err(e) = init_logging(
        Some(settings.effective_log_level()),
        settings.log_format.as_deref(),
        settings.log_file.as_ref().and_then(|p| p.to_str()),
        settings.use_color(stdout_is_terminal),
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return EXIT_FAILURE;
    }
    if let Some(path) = &settings.config_file {
        log::debug!("Configuration loaded from {}", path.display());
    }
    log::debug!("Resolved settings: {:?}", settings);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let error = RunError::Runtime(format!("Failed to start async runtime: {}", e));
            log_error_with_context(&error, "Starting");
            return error.exit_code();
        }
    };

    let code = runtime.block_on(run(settings, stdout_is_terminal));
    // Blocking git calls observe the cancellation flag; do not wait on stragglers
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    code
}

async fn run(settings: Settings, stdout_is_terminal: bool) -> i32 {
    let coordinator = ShutdownCoordinator::install();
    let colors = settings.use_color(stdout_is_terminal);
    let Settings { root, run, .. } = settings;

    let outcome = execute(
        root,
        Arc::new(run),
        Arc::new(GixClient::new()),
        coordinator.signal(),
        colors,
    )
    .await;

    let code = outcome.exit_code();
    log::debug!("Exiting with status {}", code);
    code
}
