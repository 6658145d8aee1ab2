//! Error types for sprout builds.
//!
//! Every failure a build can hit is one of a handful of families: the
//! configuration was rejected before anything touched the disk, the route tree
//! was malformed, a compiler stage failed, the HTML template was unusable, or
//! the file system refused an operation.

use std::path::PathBuf;
use thiserror::Error;

use crate::compile::CompileTarget;
use crate::options::Bundler;
use crate::runtime::RuntimeError;

/// Errors returned by [`Builder::build`](crate::Builder::build) and the
/// operations it composes.
#[derive(Debug, Error)]
pub enum Error {
    /// The build configuration was rejected. No directory has been touched.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The routes directory could not be turned into a manifest.
    #[error("Invalid routes: {0}")]
    Manifest(#[from] ManifestError),

    /// A compiler stage failed. Later stages did not run.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The HTML template is missing or unusable.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A file-system operation failed.
    #[error("File system error: {0}")]
    Runtime(#[from] RuntimeError),

    /// `build.json` could not be serialized or parsed.
    #[error("Build info error: {0}")]
    Json(#[from] serde_json::Error),

    /// The client build produced no chunk for a required logical asset.
    #[error("Client build has no `{0}` asset")]
    MissingEntryChunk(String),
}

/// Result type alias for sprout-build operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown bundler '{0}' (expected 'rollup' or 'webpack')")]
    UnknownBundler(String),

    #[error("could not find rollup.config.js or webpack.config.js in {}", .0.display())]
    BundlerNotDetected(PathBuf),

    #[error("found both rollup.config.js and webpack.config.js in {}", .0.display())]
    AmbiguousBundler(PathBuf),

    #[error("legacy builds are not supported for projects using {bundler}")]
    LegacyUnsupported { bundler: Bundler },

    /// `output` or `dest` would wipe a directory the build reads from.
    #[error("refusing to use {} as the {field} directory: it contains {protects}", path.display())]
    UnsafeOutputPath {
        field: &'static str,
        path: PathBuf,
        protects: &'static str,
    },

    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("routes directory not found: {}", .0.display())]
    RoutesNotFound(PathBuf),

    #[error("the {a} and {b} routes clash")]
    RouteClash { a: String, b: String },

    #[error("invalid route {file}: {reason}")]
    InvalidSegment { file: String, reason: String },

    #[error("found more than one service worker entry ({a} and {b})")]
    DuplicateServiceWorker { a: String, b: String },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// A compiler stage failed.
#[derive(Debug, Error)]
#[error("{target} compilation failed: {message}")]
pub struct CompileError {
    pub target: CompileTarget,
    pub message: String,
    /// Raw diagnostics reported by the underlying toolchain.
    pub diagnostics: Vec<String>,
}

impl CompileError {
    pub fn new(target: CompileTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<String>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{} must include a {placeholder} placeholder", file.display())]
    MissingPlaceholder {
        file: PathBuf,
        placeholder: &'static str,
    },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Config(ConfigError::UnknownBundler(_)) => "sprout::config::unknown_bundler",
            Error::Config(ConfigError::BundlerNotDetected(_)) => "sprout::config::no_bundler",
            Error::Config(ConfigError::AmbiguousBundler(_)) => "sprout::config::ambiguous_bundler",
            Error::Config(ConfigError::LegacyUnsupported { .. }) => "sprout::config::legacy",
            Error::Config(ConfigError::UnsafeOutputPath { .. }) => "sprout::config::unsafe_path",
            Error::Config(ConfigError::CurrentDir(_)) => "sprout::config::cwd",
            Error::Manifest(ManifestError::RoutesNotFound(_)) => "sprout::routes::not_found",
            Error::Manifest(ManifestError::RouteClash { .. }) => "sprout::routes::clash",
            Error::Manifest(ManifestError::InvalidSegment { .. }) => "sprout::routes::segment",
            Error::Manifest(ManifestError::DuplicateServiceWorker { .. }) => {
                "sprout::routes::service_worker"
            }
            Error::Manifest(ManifestError::Runtime(_)) => "sprout::routes::io",
            Error::Compile(_) => "sprout::compile",
            Error::Template(_) => "sprout::template",
            Error::Runtime(_) => "sprout::io",
            Error::Json(_) => "sprout::build_info",
            Error::MissingEntryChunk(_) => "sprout::missing_entry",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Config(ConfigError::UnknownBundler(_))
            | Error::Config(ConfigError::AmbiguousBundler(_)) => Some(Box::new(
                "Pass --bundler rollup or --bundler webpack to choose explicitly.",
            )),
            Error::Config(ConfigError::BundlerNotDetected(_)) => Some(Box::new(
                "Add a rollup.config.js or webpack.config.js to the project root, or pass --bundler.",
            )),
            Error::Config(ConfigError::LegacyUnsupported { .. }) => Some(Box::new(
                "Legacy (nomodule) builds require rollup. Drop --legacy or switch bundlers.",
            )),
            Error::Config(ConfigError::UnsafeOutputPath { .. }) => Some(Box::new(
                "Both directories are deleted at the start of every build. Point them somewhere dedicated.",
            )),
            Error::Manifest(ManifestError::RouteClash { .. }) => Some(Box::new(
                "Two files resolve to the same URL pattern. Rename or remove one of them.",
            )),
            Error::Manifest(ManifestError::DuplicateServiceWorker { .. }) => Some(Box::new(
                "Keep a single service-worker.js or service-worker.ts in the routes directory.",
            )),
            Error::Compile(err) if !err.diagnostics.is_empty() => {
                Some(Box::new(err.diagnostics.join("\n")))
            }
            Error::Template(TemplateError::NotFound(_)) => Some(Box::new(
                "Create the template or point --template-file at an existing one.",
            )),
            Error::MissingEntryChunk(name) => Some(Box::new(format!(
                "The client bundle must emit an entry chunk named `{}`.",
                name
            ))),
            _ => None,
        }
    }
}
