//! sprout CLI - build sprout apps from the command line.
//!
//! Thin layer over [`sprout_build`]:
//!
//! - [`cli`] - argument definitions
//! - [`config`] - layered configuration (defaults, `sprout.toml`, `SPROUT_*`, flags)
//! - [`commands`] - `sprout build` and `sprout routes`
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines and the build summary table

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result};
