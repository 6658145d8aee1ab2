//! Build configuration and its resolution into absolute, validated options.
//!
//! [`BuildConfig`] is what users write (in `sprout.toml`, the environment or
//! on the command line). [`BuildOptions::resolve`] turns it into the absolute
//! paths and concrete bundler the orchestrator works with, rejecting anything
//! that must fail before a single directory is touched.

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::compile::BuildPaths;
use crate::error::ConfigError;
use crate::runtime::Runtime;

/// Supported bundler toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bundler {
    Rollup,
    Webpack,
}

impl Bundler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bundler::Rollup => "rollup",
            Bundler::Webpack => "webpack",
        }
    }

    /// Config file names this bundler is detected by, in preference order.
    pub fn config_files(&self) -> &'static [&'static str] {
        match self {
            Bundler::Rollup => &["rollup.config.js", "rollup.config.mjs"],
            Bundler::Webpack => &["webpack.config.js"],
        }
    }

    /// Path of the bundler config inside `cwd`, falling back to the
    /// conventional name when none exists yet.
    pub fn config_path(&self, runtime: &dyn Runtime, cwd: &Path) -> PathBuf {
        let files = self.config_files();
        files
            .iter()
            .map(|name| cwd.join(name))
            .find(|path| runtime.exists(path))
            .unwrap_or_else(|| cwd.join(files[0]))
    }

    /// Whether a second, `nomodule` client build can be produced.
    pub fn supports_legacy(&self) -> bool {
        matches!(self, Bundler::Rollup)
    }

    /// Whether emitted chunks carry placeholders that must be rewritten once
    /// `build.json` exists.
    pub fn needs_manifest_injection(&self) -> bool {
        matches!(self, Bundler::Rollup)
    }

    /// Pick the bundler from the config files present in `cwd`.
    pub fn detect(runtime: &dyn Runtime, cwd: &Path) -> Result<Self, ConfigError> {
        let has = |bundler: Bundler| {
            bundler
                .config_files()
                .iter()
                .any(|name| runtime.exists(&cwd.join(name)))
        };

        match (has(Bundler::Rollup), has(Bundler::Webpack)) {
            (true, false) => Ok(Bundler::Rollup),
            (false, true) => Ok(Bundler::Webpack),
            (true, true) => Err(ConfigError::AmbiguousBundler(cwd.to_path_buf())),
            (false, false) => Err(ConfigError::BundlerNotDetected(cwd.to_path_buf())),
        }
    }
}

impl fmt::Display for Bundler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bundler {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rollup" => Ok(Bundler::Rollup),
            "webpack" => Ok(Bundler::Webpack),
            _ => Err(ConfigError::UnknownBundler(s.to_string())),
        }
    }
}

/// User-facing build configuration.
///
/// Relative paths are resolved against `cwd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root. Defaults to the process working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Application source directory.
    pub src: PathBuf,

    /// Route tree.
    pub routes: PathBuf,

    /// Framework output directory the generated glue is written into.
    pub output: PathBuf,

    /// Static files copied verbatim by the host and cached by the service worker.
    #[serde(rename = "static")]
    pub static_dir: PathBuf,

    /// Build destination.
    pub dest: PathBuf,

    /// Server-side rendering. When off, a static `index.html` is emitted.
    pub ssr: bool,

    /// Hash-based client routing.
    pub hashbang: bool,

    /// HTML template, relative to `src`.
    pub template_file: String,

    /// URL prefix the app is mounted under.
    pub basepath: String,

    /// `rollup` or `webpack`. Detected from config files when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundler: Option<String>,

    /// Produce an additional `nomodule` client build.
    pub legacy: bool,

    /// Extensions treated as page components.
    #[serde(deserialize_with = "deserialize_ext")]
    pub ext: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cwd: None,
            src: PathBuf::from("src"),
            routes: PathBuf::from("src/routes"),
            output: PathBuf::from("src/node_modules/@sprout"),
            static_dir: PathBuf::from("static"),
            dest: PathBuf::from("__sprout__/build"),
            ssr: true,
            hashbang: false,
            template_file: "template.html".to_string(),
            basepath: String::new(),
            bundler: None,
            legacy: false,
            ext: vec![".svelte".to_string(), ".html".to_string()],
        }
    }
}

impl BuildConfig {
    /// Absolute project directory.
    pub fn project_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(match &self.cwd {
            Some(cwd) if cwd.is_absolute() => cwd.clean(),
            other => {
                let current = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
                match other {
                    Some(relative) => current.join(relative).clean(),
                    None => current,
                }
            }
        })
    }

    /// Absolute routes directory and normalized page extensions.
    ///
    /// Enough to scan the route tree without resolving a bundler.
    pub fn route_source(&self) -> Result<(PathBuf, Vec<String>), ConfigError> {
        let routes = self.project_dir()?.join(&self.routes).clean();
        Ok((routes, normalize_ext(&self.ext)))
    }
}

/// Accepts either a list or a single whitespace/comma separated string.
fn deserialize_ext<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ext {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Ext::deserialize(deserializer)? {
        Ext::One(list) => list
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Ext::Many(list) => list,
    })
}

/// Fully resolved build options. All paths are absolute and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub cwd: PathBuf,
    pub src: PathBuf,
    pub routes: PathBuf,
    pub output: PathBuf,
    pub static_dir: PathBuf,
    pub dest: PathBuf,
    pub ssr: bool,
    pub hashbang: bool,
    pub legacy: bool,
    /// Normalized without leading or trailing slashes.
    pub basepath: String,
    pub bundler: Bundler,
    /// Normalized with a leading dot, deduplicated.
    pub ext: Vec<String>,
    pub template_file: String,
}

impl BuildOptions {
    /// Validate `config` and resolve it against the project directory.
    ///
    /// Touches nothing on disk; only existence checks go through `runtime`.
    pub fn resolve(config: &BuildConfig, runtime: &dyn Runtime) -> Result<Self, ConfigError> {
        let cwd = config.project_dir()?;

        let bundler = match config.bundler.as_deref() {
            Some(name) => name.parse()?,
            None => Bundler::detect(runtime, &cwd)?,
        };

        let absolute = |path: &Path| cwd.join(path).clean();
        let options = Self {
            src: absolute(&config.src),
            routes: absolute(&config.routes),
            output: absolute(&config.output),
            static_dir: absolute(&config.static_dir),
            dest: absolute(&config.dest),
            ssr: config.ssr,
            hashbang: config.hashbang,
            legacy: config.legacy,
            basepath: config.basepath.trim_matches('/').to_string(),
            bundler,
            ext: normalize_ext(&config.ext),
            template_file: config.template_file.clone(),
            cwd,
        };

        if options.legacy && !bundler.supports_legacy() {
            return Err(ConfigError::LegacyUnsupported { bundler });
        }

        options.check_wipe_targets()?;
        Ok(options)
    }

    /// `output` and `dest` are deleted at the start of every build, so neither
    /// may contain a directory the build reads from.
    fn check_wipe_targets(&self) -> Result<(), ConfigError> {
        let protected: [(&Path, &'static str); 4] = [
            (&self.cwd, "the project directory"),
            (&self.src, "the source directory"),
            (&self.routes, "the routes directory"),
            (&self.static_dir, "the static directory"),
        ];

        for (field, path) in [("output", &self.output), ("dest", &self.dest)] {
            if let Some((_, protects)) = protected.iter().find(|(dir, _)| dir.starts_with(path)) {
                return Err(ConfigError::UnsafeOutputPath {
                    field,
                    path: path.clone(),
                    protects: *protects,
                });
            }
        }

        if self.output.starts_with(&self.dest) {
            return Err(ConfigError::UnsafeOutputPath {
                field: "dest",
                path: self.dest.clone(),
                protects: "the framework output directory",
            });
        }

        Ok(())
    }

    pub fn paths(&self) -> BuildPaths {
        BuildPaths {
            src: self.src.clone(),
            routes: self.routes.clone(),
        }
    }

    pub fn client_dir(&self) -> PathBuf {
        self.dest.join("client")
    }

    pub fn server_dir(&self) -> PathBuf {
        self.dest.join("server")
    }

    pub fn build_info_path(&self) -> PathBuf {
        self.dest.join("build.json")
    }

    pub fn template_path(&self) -> PathBuf {
        self.src.join(&self.template_file)
    }
}

fn normalize_ext(ext: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(ext.len());
    for raw in ext {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let ext = if raw.starts_with('.') {
            raw.to_string()
        } else {
            format!(".{}", raw)
        };
        if !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }
    normalized
}
