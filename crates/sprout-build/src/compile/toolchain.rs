//! Compilers that drive the project's own rollup or webpack installation.
//!
//! Each stage runs the bundler CLI through `npx` in the project directory.
//! The stage is described to the bundler config through environment variables
//! on the child process only:
//!
//! | Variable               | Value                                   |
//! |------------------------|-----------------------------------------|
//! | `SPROUT_TARGET`        | `client`, `server` or `serviceworker`   |
//! | `SPROUT_LEGACY_BUILD`  | `true` for the `nomodule` client build; |
//! |                        | removed for every other stage           |
//! | `SPROUT_SRC`           | absolute source directory               |
//! | `SPROUT_DEST`          | absolute build destination              |
//! | `SPROUT_SERVICE_WORKER`| service worker entry, when there is one |
//! | `NODE_ENV`             | `production` or `development`           |
//!
//! Rollup results are read back from the output directory; webpack results
//! come from its `--json` stats.
//!
//! Client chunks are tied to route components through what the bundler
//! reports, never through file names alone. Rollup client stages run with
//! `--sourcemap` and `[name].[hash]` file names, and each map's `sources` say
//! which modules a chunk bundles. Webpack reports the chunks of every
//! `webpackChunkName` the generated client manifest assigns.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{
    BuildMode, CompileResult, CompileTarget, Compiler, CompilerFactory, CompilerOptions,
    CompilerSet,
};
use crate::error::CompileError;
use crate::options::Bundler;
use crate::runtime::{Runtime, list_files};

/// Conventional service worker entries outside the routes directory.
const SERVICE_WORKER_ENTRIES: &[&str] = &["service-worker.js", "service-worker.ts"];

/// Rollup output options forced on client stages.
const ROLLUP_CLIENT_ARGS: &[&str] = &[
    "--entryFileNames",
    "[name].[hash].js",
    "--chunkFileNames",
    "[name].[hash].js",
    "--assetFileNames",
    "[name].[hash][extname]",
    "--sourcemap",
];

const LEGACY_ENV: &str = "SPROUT_LEGACY_BUILD";

/// Factory for compilers backed by the bundler CLI.
#[derive(Debug, Clone)]
pub struct ToolchainCompilers {
    runtime: Arc<dyn Runtime>,
    program: String,
}

impl ToolchainCompilers {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            program: "npx".to_string(),
        }
    }

    /// Override the launcher used to run the bundler (default `npx`).
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn compiler(&self, options: &CompilerOptions, target: CompileTarget) -> ToolchainCompiler {
        ToolchainCompiler {
            runtime: Arc::clone(&self.runtime),
            program: self.program.clone(),
            config: options.bundler.config_path(self.runtime.as_ref(), &options.cwd),
            bundler: options.bundler,
            target,
            mode: options.mode,
            dev: options.dev,
            cwd: options.cwd.clone(),
            src: options.src.clone(),
            dest: options.dest.clone(),
            service_worker: options.service_worker.clone(),
        }
    }
}

#[async_trait]
impl CompilerFactory for ToolchainCompilers {
    async fn create(&self, options: &CompilerOptions) -> crate::Result<CompilerSet> {
        let service_worker = options.service_worker.clone().or_else(|| {
            SERVICE_WORKER_ENTRIES
                .iter()
                .map(|name| options.src.join(name))
                .find(|path| self.runtime.exists(path))
        });
        let options = CompilerOptions {
            service_worker,
            ..options.clone()
        };

        let sw = options.service_worker.is_some().then(|| {
            Box::new(self.compiler(&options, CompileTarget::ServiceWorker)) as Box<dyn Compiler>
        });

        Ok(CompilerSet::for_bundler(
            options.bundler,
            Box::new(self.compiler(&options, CompileTarget::Client)),
            Box::new(self.compiler(&options, CompileTarget::Server)),
            sw,
        ))
    }
}

#[derive(Debug)]
struct ToolchainCompiler {
    runtime: Arc<dyn Runtime>,
    program: String,
    config: PathBuf,
    bundler: Bundler,
    target: CompileTarget,
    mode: BuildMode,
    dev: bool,
    cwd: PathBuf,
    src: PathBuf,
    dest: PathBuf,
    service_worker: Option<PathBuf>,
}

impl ToolchainCompiler {
    fn args(&self) -> Vec<String> {
        let config = self.config.to_string_lossy().into_owned();
        match self.bundler {
            Bundler::Rollup => {
                let mut args = vec!["rollup".to_string(), "--config".to_string(), config];
                if self.target == CompileTarget::Client {
                    args.extend(ROLLUP_CLIENT_ARGS.iter().map(|arg| arg.to_string()));
                }
                args
            }
            Bundler::Webpack => vec![
                "webpack".into(),
                "--config".into(),
                config,
                "--config-name".into(),
                self.target.as_str().into(),
                "--mode".into(),
                if self.dev { "development" } else { "production" }.into(),
                "--json".into(),
            ],
        }
    }

    fn envs(&self) -> Vec<(&'static str, String)> {
        let mut envs = vec![
            ("SPROUT_TARGET", self.target.as_str().to_string()),
            ("SPROUT_SRC", self.src.to_string_lossy().into_owned()),
            ("SPROUT_DEST", self.dest.to_string_lossy().into_owned()),
            (
                "NODE_ENV",
                if self.dev { "development" } else { "production" }.to_string(),
            ),
        ];
        if self.mode == BuildMode::Legacy {
            envs.push((LEGACY_ENV, "true".to_string()));
        }
        if let Some(entry) = &self.service_worker {
            envs.push(("SPROUT_SERVICE_WORKER", entry.to_string_lossy().into_owned()));
        }
        envs
    }

    /// Directory the stage writes into and, for the client, the subdirectory
    /// that separates legacy output.
    fn output_dir(&self) -> PathBuf {
        match (self.target, self.mode) {
            (CompileTarget::Client, BuildMode::Legacy) => self.dest.join("client").join("legacy"),
            (CompileTarget::Client, BuildMode::Modern) => self.dest.join("client"),
            (CompileTarget::Server, _) => self.dest.join("server"),
            (CompileTarget::ServiceWorker, _) => self.dest.clone(),
        }
    }

    /// Directory emitted file names are relative to. Legacy client files
    /// keep their `legacy/` prefix.
    fn chunk_root(&self) -> PathBuf {
        match self.target {
            CompileTarget::Client => self.dest.join("client"),
            CompileTarget::Server => self.dest.join("server"),
            CompileTarget::ServiceWorker => self.dest.clone(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .current_dir(&self.cwd)
            .args(self.args())
            .envs(self.envs())
            .kill_on_drop(true);
        // Only this compiler's mode may reach the bundler, never the parent's.
        if self.mode == BuildMode::Modern {
            command.env_remove(LEGACY_ENV);
        }
        command
    }

    async fn run(&self) -> Result<Output, CompileError> {
        let mut command = self.command();

        debug!(
            stage = %self.target,
            bundler = %self.bundler,
            legacy = self.mode == BuildMode::Legacy,
            "Running {} {}",
            self.program,
            self.args().join(" ")
        );

        command.output().await.map_err(|e| {
            CompileError::new(
                self.target,
                format!("failed to run {} {}: {}", self.program, self.bundler, e),
            )
        })
    }

    /// Read rollup's output back from disk.
    async fn collect_rollup(&self, output: &Output) -> Result<CompileResult, CompileError> {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(CompileError::new(
                self.target,
                format!("rollup exited with {}", output.status),
            )
            .with_diagnostics(non_empty_lines(&stderr)));
        }

        let dir = self.output_dir();
        if !self.runtime.exists(&dir) {
            return Err(CompileError::new(
                self.target,
                format!("rollup produced no output in {}", dir.display()),
            ));
        }

        let files = list_files(self.runtime.as_ref(), &dir)
            .await
            .map_err(|e| CompileError::new(self.target, e.to_string()))?;
        let files = self.select_files(files);

        let warnings = stderr
            .lines()
            .filter(|line| line.trim_start().starts_with("(!)"))
            .map(|line| line.trim().to_string())
            .collect();

        let result = CompileResult::from_files(self.target, self.bundler, files);
        Ok(self.read_source_maps(result).await.with_warnings(warnings))
    }

    /// Record the modules each chunk bundles, as listed by its source map.
    async fn read_source_maps(&self, mut result: CompileResult) -> CompileResult {
        let root = self.chunk_root();
        let mapped: Vec<(String, String)> = result
            .code_chunks()
            .filter_map(|chunk| Some((chunk.file.clone(), chunk.map.clone()?)))
            .collect();

        for (chunk, map) in mapped {
            let path = root.join(&map);
            let source_map = match self.runtime.read_file(&path).await {
                Ok(bytes) => serde_json::from_slice::<SourceMap>(&bytes).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match source_map {
                Ok(source_map) => result.add_chunk_modules(&chunk, source_map.modules(&path)),
                Err(e) => warn!(map = %path.display(), "Skipping unreadable source map: {}", e),
            }
        }
        result
    }

    /// Narrow a directory listing to the files this stage owns, relative to
    /// the stage's chunk directory.
    fn select_files(&self, files: Vec<String>) -> Vec<String> {
        match (self.target, self.mode) {
            (CompileTarget::Client, BuildMode::Modern) => files
                .into_iter()
                .filter(|file| !file.starts_with("legacy/"))
                .collect(),
            (CompileTarget::Client, BuildMode::Legacy) => files
                .into_iter()
                .map(|file| format!("legacy/{}", file))
                .collect(),
            (CompileTarget::Server, _) => files,
            (CompileTarget::ServiceWorker, _) => files
                .into_iter()
                .filter(|file| !file.contains('/') && file.starts_with("service-worker"))
                .collect(),
        }
    }

    /// Parse webpack's `--json` stats.
    fn collect_webpack(&self, output: &Output) -> Result<CompileResult, CompileError> {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let stats = stdout
            .find('{')
            .and_then(|start| serde_json::from_str::<WebpackStats>(&stdout[start..]).ok());
        let Some(stats) = stats else {
            return Err(CompileError::new(
                self.target,
                format!("webpack exited with {} and no stats", output.status),
            )
            .with_diagnostics(non_empty_lines(&stderr)));
        };
        let stats = stats.select(self.target.as_str());

        if !stats.errors.is_empty() || !output.status.success() {
            return Err(CompileError::new(
                self.target,
                format!("webpack reported {} error(s)", stats.errors.len()),
            )
            .with_diagnostics(stats.errors.into_iter().map(StatsMessage::into_text).collect()));
        }

        let files = stats.assets.into_iter().map(|asset| asset.name).collect();
        let mut result = CompileResult::from_files(self.target, self.bundler, files);

        // Named chunks from the stats take precedence over file-name guessing.
        for (name, emitted) in stats.assets_by_chunk_name {
            let emitted = emitted.into_vec();
            result.add_named_chunk(&name, emitted.iter().filter(|f| !f.ends_with(".map")).cloned());
            if let Some(js) = emitted
                .iter()
                .find(|f| f.ends_with(".js") || f.ends_with(".mjs"))
            {
                result.assets.insert(name.clone(), js.clone());
            }
            if let Some(css) = emitted.iter().find(|f| f.ends_with(".css")) {
                result.assets.insert(format!("{}.css", name), css.clone());
            }
        }

        Ok(result.with_warnings(
            stats
                .warnings
                .into_iter()
                .map(StatsMessage::into_text)
                .collect(),
        ))
    }
}

#[async_trait]
impl Compiler for ToolchainCompiler {
    fn target(&self) -> CompileTarget {
        self.target
    }

    async fn compile(&self) -> Result<CompileResult, CompileError> {
        let started = Instant::now();
        let output = self.run().await?;

        let result = match self.bundler {
            Bundler::Rollup => self.collect_rollup(&output).await?,
            Bundler::Webpack => self.collect_webpack(&output)?,
        };

        for warning in &result.warnings {
            warn!(stage = %self.target, "{}", warning);
        }

        Ok(result.with_duration(started.elapsed()))
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebpackStats {
    name: Option<String>,
    assets: Vec<StatsAsset>,
    #[serde(rename = "assetsByChunkName")]
    assets_by_chunk_name: BTreeMap<String, OneOrMany>,
    errors: Vec<StatsMessage>,
    warnings: Vec<StatsMessage>,
    children: Vec<WebpackStats>,
}

impl WebpackStats {
    /// Multi-config builds nest the selected compilation under `children`.
    fn select(mut self, name: &str) -> Self {
        if !self.assets.is_empty() || self.children.is_empty() {
            return self;
        }
        let index = self
            .children
            .iter()
            .position(|child| child.name.as_deref() == Some(name))
            .unwrap_or(0);
        let mut child = self.children.swap_remove(index);
        child.errors.extend(self.errors);
        child
    }
}

/// The parts of a source map that identify bundled modules.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourceMap {
    #[serde(rename = "sourceRoot")]
    source_root: Option<String>,
    sources: Vec<String>,
}

impl SourceMap {
    /// Sources resolved against the map's own location. Virtual modules
    /// (`\0`-prefixed) have no file and are skipped.
    fn modules(&self, map_path: &Path) -> Vec<PathBuf> {
        let mut base = map_path.parent().unwrap_or(Path::new("")).to_path_buf();
        if let Some(root) = self.source_root.as_deref().filter(|root| !root.is_empty()) {
            base.push(root);
        }
        self.sources
            .iter()
            .filter(|source| !source.starts_with('\0'))
            .map(|source| base.join(source).clean())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct StatsAsset {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(file) => vec![file],
            OneOrMany::Many(files) => files,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatsMessage {
    Text(String),
    Detailed { message: String },
}

impl StatsMessage {
    fn into_text(self) -> String {
        match self {
            StatsMessage::Text(text) => text,
            StatsMessage::Detailed { message } => message,
        }
    }
}
