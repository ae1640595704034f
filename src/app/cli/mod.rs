//! Command line arguments and configuration file layering

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{resolve_settings, ConfigError, Settings};
