//! Error handling for the sprout CLI.
//!
//! Library failures pass through unchanged as [`CliError::Build`] so their
//! miette diagnostics (codes, help texts) survive to the terminal. Everything
//! the CLI itself can get wrong lives in [`ConfigError`].

use miette::Report;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The build itself failed
    #[error(transparent)]
    Build(#[from] sprout_build::Error),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--config` points at a file that does not exist
    #[error("Config file not found: {}\n\nHint: Create a sprout.toml file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// A layer could not be merged or extracted
    #[error("Invalid configuration: {0}\n\nHint: Check sprout.toml and SPROUT_* environment variables")]
    Invalid(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Invalid(Box::new(err))
    }
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Convert a CLI error into a report for rendering.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        other => miette::miette!("{}", other),
    }
}
