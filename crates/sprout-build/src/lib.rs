//! # sprout-build
//!
//! Production build orchestration for sprout apps.
//!
//! A sprout app is a directory of route files: pages, layouts, endpoints and
//! an optional service worker. This crate turns that tree into:
//!
//! - a client bundle under `dest/client` (plus an optional `nomodule` build
//!   under `dest/client/legacy`)
//! - a server bundle under `dest/server`
//! - an optional service worker at the root of `dest`
//! - `dest/build.json`, the artifact manifest the server runtime reads
//! - `dest/index.html` when server-side rendering is disabled
//!
//! Bundling itself is delegated to the project's rollup or webpack through
//! the [`Compiler`] seam; this crate decides what runs, in which order, with
//! which inputs, and records what came out.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sprout_build::{BuildConfig, Builder};
//!
//! # async fn run() -> sprout_build::Result<()> {
//! let config = BuildConfig {
//!     bundler: Some("rollup".to_string()),
//!     ..Default::default()
//! };
//! let report = Builder::new().build(&config).await?;
//! println!("{} client chunks", report.info.chunks.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate only emits [`tracing`] events. Install a subscriber in the
//! binary to see them.

mod app;
mod builder;
pub mod compile;
mod error;
mod index_html;
pub mod manifest;
mod options;
pub mod runtime;
mod service_worker;
mod template;

pub use app::{AppOptions, copy_runtime, create_app};
pub use builder::{
    BuildObserver, BuildPhase, BuildReport, Builder, NoopObserver, Stage, StageSummary, build,
};
pub use compile::{
    BuildInfo, BuildMode, BuildPaths, Chunk, CompileResult, CompileTarget, Compiler,
    CompilerFactory, CompilerOptions, CompilerSet, ToolchainCompilers, inject_resources,
};
pub use error::{CompileError, ConfigError, Error, ManifestError, Result, TemplateError};
pub use index_html::{IndexInputs, create_index_html};
pub use manifest::{ManifestData, create_manifest_data};
pub use options::{BuildConfig, BuildOptions, Bundler};
pub use runtime::{NativeRuntime, Runtime, RuntimeError};
pub use service_worker::{SERVICE_WORKER_MODULE, ServiceWorkerInputs, create_serviceworker_manifest};
pub use template::{minify_html, read_template};
