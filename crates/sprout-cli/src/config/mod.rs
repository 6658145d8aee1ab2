//! Layered configuration for the sprout CLI.
//!
//! Priority: CLI flags > `SPROUT_*` environment > `sprout.toml` > defaults.

mod tests;

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::Serialize;
use sprout_build::BuildConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::{BuildArgs, ProjectArgs};
use crate::error::ConfigError;

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "sprout.toml";

/// Environment variables read with the `SPROUT_` prefix.
///
/// Limited to config keys; `SPROUT_TARGET` and the other variables set for
/// bundler processes are ignored.
const ENV_KEYS: &[&str] = &[
    "cwd",
    "src",
    "routes",
    "output",
    "static",
    "dest",
    "ssr",
    "hashbang",
    "template_file",
    "basepath",
    "bundler",
    "legacy",
    "ext",
];

/// Values given on the command line. Unset flags are omitted so they never
/// mask lower layers.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(rename = "static", skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashbang: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

impl Overrides {
    pub fn from_project(args: &ProjectArgs) -> Self {
        Self {
            cwd: args.cwd.clone(),
            src: args.src.clone(),
            routes: args.routes.clone(),
            ext: args.ext.clone(),
            ..Default::default()
        }
    }

    /// Boolean switches only override when set; `--no-ssr` can turn SSR off
    /// but never back on.
    pub fn from_build(args: &BuildArgs) -> Self {
        Self {
            output: args.output.clone(),
            static_dir: args.static_dir.clone(),
            dest: args.dest.clone(),
            ssr: args.no_ssr.then_some(false),
            hashbang: args.hashbang.then_some(true),
            template_file: args.template_file.clone(),
            basepath: args.basepath.clone(),
            bundler: args.bundler.clone(),
            legacy: args.legacy.then_some(true),
            ..Self::from_project(&args.project)
        }
    }
}

/// Load the effective build configuration.
pub fn load(project: &ProjectArgs, overrides: &Overrides) -> Result<BuildConfig, ConfigError> {
    let mut figment = Figment::new().merge(Serialized::defaults(BuildConfig::default()));

    if let Some(path) = config_file(project)? {
        debug!(path = %path.display(), "Loading config file");
        figment = figment.merge(Toml::file(path));
    }

    let config = figment
        .merge(Env::prefixed("SPROUT_").only(ENV_KEYS))
        .merge(Serialized::defaults(overrides))
        .extract()?;
    Ok(config)
}

/// `--config` must exist; the default file in the project root is optional.
fn config_file(project: &ProjectArgs) -> Result<Option<PathBuf>, ConfigError> {
    match &project.config {
        Some(path) if path.is_file() => Ok(Some(path.clone())),
        Some(path) => Err(ConfigError::NotFound(path.clone())),
        None => {
            let root = project.cwd.as_deref().unwrap_or(Path::new("."));
            let path = root.join(CONFIG_FILE);
            Ok(path.is_file().then_some(path))
        }
    }
}
