//! Build orchestration.
//!
//! A build is one sequential pipeline. Each compile stage may suspend while
//! the bundler works, but stages never overlap:
//!
//! ```text
//! reset output + dest ─▶ manifest + glue ─▶ client ─▶ [legacy client]
//!   ─▶ build.json ─▶ [inject client] ─▶ server ─▶ [inject server]
//!   ─▶ [service worker] ─▶ [static index.html]
//! ```
//!
//! Writes are not transactional: a failing stage leaves `dest` as far as the
//! build got.

mod observer;
mod phase;

pub use observer::{BuildObserver, NoopObserver, Stage};
pub use phase::{BuildPhase, StageSummary};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::Result;
use crate::app::{AppOptions, copy_runtime, create_app};
use crate::compile::{
    BuildInfo, BuildMode, CompileResult, Compiler, CompilerFactory, CompilerOptions,
    ToolchainCompilers, inject_resources,
};
use crate::index_html::{IndexInputs, create_index_html};
use crate::manifest::{ManifestData, create_manifest_data};
use crate::options::{BuildConfig, BuildOptions};
use crate::runtime::{NativeRuntime, Runtime, RuntimeError, list_files, read_to_string, write_file_all};
use crate::service_worker::{SERVICE_WORKER_MODULE, ServiceWorkerInputs, create_serviceworker_manifest};
use crate::template::{minify_html, read_template};

/// What a finished build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub options: BuildOptions,
    /// The record written to `build.json`.
    pub info: BuildInfo,
    /// Phases entered, in order.
    pub phases: Vec<BuildPhase>,
    pub stages: Vec<StageSummary>,
}

/// Configures and runs builds.
///
/// ```rust,ignore
/// let report = Builder::new()
///     .observer(|stage: Stage, result: &CompileResult| {
///         println!("{stage}: {} chunks", result.chunks.len());
///         Ok(())
///     })
///     .build(&BuildConfig::default())
///     .await?;
/// ```
#[derive(Clone)]
pub struct Builder {
    runtime: Arc<dyn Runtime>,
    compilers: Option<Arc<dyn CompilerFactory>>,
    observer: Arc<dyn BuildObserver>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("runtime", &self.runtime)
            .field("compilers", &self.compilers)
            .finish_non_exhaustive()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            runtime: Arc::new(NativeRuntime),
            compilers: None,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Use a custom compiler factory instead of the rollup/webpack CLI.
    pub fn compilers(mut self, compilers: Arc<dyn CompilerFactory>) -> Self {
        self.compilers = Some(compilers);
        self
    }

    pub fn observer(mut self, observer: impl BuildObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Run one build.
    ///
    /// Configuration errors are reported before anything on disk changes.
    pub async fn build(&self, config: &BuildConfig) -> Result<BuildReport> {
        let options = BuildOptions::resolve(config, self.runtime.as_ref())?;
        let compilers = match &self.compilers {
            Some(compilers) => Arc::clone(compilers),
            None => Arc::new(ToolchainCompilers::new(Arc::clone(&self.runtime))),
        };

        BuildRun {
            runtime: self.runtime.as_ref(),
            compilers: compilers.as_ref(),
            observer: self.observer.as_ref(),
            options,
            phases: vec![BuildPhase::Init],
            stages: Vec::new(),
        }
        .run()
        .await
    }
}

/// Build with the default runtime and toolchain compilers.
pub async fn build(config: &BuildConfig) -> Result<BuildReport> {
    Builder::new().build(config).await
}

struct BuildRun<'a> {
    runtime: &'a dyn Runtime,
    compilers: &'a dyn CompilerFactory,
    observer: &'a dyn BuildObserver,
    options: BuildOptions,
    phases: Vec<BuildPhase>,
    stages: Vec<StageSummary>,
}

impl BuildRun<'_> {
    async fn run(mut self) -> Result<BuildReport> {
        let started = Instant::now();
        info!(
            bundler = %self.options.bundler,
            dest = %self.options.dest.display(),
            ssr = self.options.ssr,
            legacy = self.options.legacy,
            "Starting build"
        );

        self.enter(BuildPhase::ResetOutputDirs);
        self.reset_output_dirs().await?;

        self.enter(BuildPhase::EmitGlue);
        let manifest =
            create_manifest_data(self.runtime, &self.options.routes, &self.options.ext).await?;
        create_app(
            self.runtime,
            &AppOptions {
                manifest: &manifest,
                cwd: &self.options.cwd,
                src: &self.options.src,
                routes: &self.options.routes,
                output: &self.options.output,
                dest: &self.options.dest,
                bundler: self.options.bundler,
                hashbang: self.options.hashbang,
                dev: false,
            },
        )
        .await?;

        let compilers = self
            .compilers
            .create(&self.compiler_options(BuildMode::Modern, &manifest))
            .await?;

        self.enter(BuildPhase::CompileClient);
        let client = self.compile(compilers.client.as_ref()).await?;
        self.complete(Stage::Client, &client);
        let mut info = client.to_json(&manifest, &self.options.paths());

        if self.options.legacy {
            self.enter(BuildPhase::CompileLegacyClient);
            let legacy_compilers = self
                .compilers
                .create(&self.compiler_options(BuildMode::Legacy, &manifest))
                .await?;
            let legacy = self.compile(legacy_compilers.client.as_ref()).await?;
            self.complete(Stage::LegacyClient, &legacy);
            info.legacy_assets = Some(legacy.assets);
        }

        self.enter(BuildPhase::WriteManifest);
        let build_info_path = self.options.build_info_path();
        write_file_all(
            self.runtime,
            &build_info_path,
            info.to_json_string()?.as_bytes(),
        )
        .await?;

        if compilers.needs_manifest_injection() {
            self.enter(BuildPhase::InjectClient);
            inject_resources(self.runtime, &build_info_path, &self.options.client_dir()).await?;
        }

        self.enter(BuildPhase::CompileServer);
        let server = self.compile(compilers.server.as_ref()).await?;
        if compilers.needs_manifest_injection() {
            self.enter(BuildPhase::InjectServer);
            inject_resources(self.runtime, &build_info_path, &self.options.server_dir()).await?;
        }
        self.complete(Stage::Server, &server);

        if let Some(service_worker) = &compilers.service_worker {
            self.enter(BuildPhase::CompileServiceWorker);
            self.write_service_worker_manifest(&manifest, &client).await?;
            let result = self.compile(service_worker.as_ref()).await?;
            self.complete(Stage::ServiceWorker, &result);
        }

        if !self.options.ssr {
            self.enter(BuildPhase::EmitStaticIndex);
            self.write_static_index(&info, compilers.service_worker.is_some())
                .await?;
        }

        self.enter(BuildPhase::Done);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            chunks = info.chunks.len(),
            "Build complete"
        );

        Ok(BuildReport {
            options: self.options,
            info,
            phases: self.phases,
            stages: self.stages,
        })
    }

    fn enter(&mut self, phase: BuildPhase) {
        debug!(%phase, "Entering build phase");
        self.phases.push(phase);
    }

    fn compiler_options(&self, mode: BuildMode, manifest: &ManifestData) -> CompilerOptions {
        CompilerOptions {
            bundler: self.options.bundler,
            cwd: self.options.cwd.clone(),
            src: self.options.src.clone(),
            dest: self.options.dest.clone(),
            dev: false,
            mode,
            service_worker: manifest
                .service_worker()
                .map(|sw| self.options.routes.join(&sw.file)),
        }
    }

    async fn compile(&self, compiler: &dyn Compiler) -> Result<CompileResult> {
        debug!(stage = %compiler.target(), "Compiling");
        Ok(compiler.compile().await?)
    }

    fn complete(&mut self, stage: Stage, result: &CompileResult) {
        info!(
            %stage,
            chunks = result.chunks.len(),
            warnings = result.warnings.len(),
            elapsed_ms = result.duration.as_millis() as u64,
            "Compiled"
        );
        self.stages.push(StageSummary {
            stage,
            chunks: result.chunks.len(),
            warnings: result.warnings.len(),
            duration: result.duration,
        });
        observer::notify(self.observer, stage, result);
    }

    /// Wipe and recreate `output` and `dest`, install the runtime and the
    /// minified template.
    #[instrument(skip_all, fields(dest = %self.options.dest.display()))]
    async fn reset_output_dirs(&self) -> Result<()> {
        let options = &self.options;
        let template = read_template(self.runtime, &options.src, &options.template_file).await?;

        self.runtime.remove_dir_all(&options.output).await?;
        self.runtime.create_dir_all(&options.output).await?;
        copy_runtime(self.runtime, &options.output, options.ssr).await?;

        self.runtime.remove_dir_all(&options.dest).await?;
        self.runtime.create_dir_all(&options.client_dir()).await?;

        write_file_all(
            self.runtime,
            &options.dest.join(&options.template_file),
            minify_html(&template).as_bytes(),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn write_service_worker_manifest(
        &self,
        manifest: &ManifestData,
        client: &CompileResult,
    ) -> Result<()> {
        let client_files: Vec<String> = client
            .code_chunks()
            .map(|chunk| format!("client/{}", chunk.file))
            .collect();
        let static_files = self.static_files().await?;

        let module = create_serviceworker_manifest(
            manifest,
            &ServiceWorkerInputs {
                client_files: &client_files,
                static_files: &static_files,
                ssr: self.options.ssr,
            },
        );
        write_file_all(
            self.runtime,
            &self.options.output.join(SERVICE_WORKER_MODULE),
            module.as_bytes(),
        )
        .await?;
        Ok(())
    }

    async fn static_files(&self) -> Result<Vec<String>> {
        match list_files(self.runtime, &self.options.static_dir).await {
            Ok(files) => Ok(files),
            Err(RuntimeError::FileNotFound(dir)) => {
                debug!(dir = %dir.display(), "No static directory");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip_all)]
    async fn write_static_index(&self, info: &BuildInfo, service_worker: bool) -> Result<()> {
        let template_path: PathBuf = self.options.dest.join(&self.options.template_file);
        let template = read_to_string(self.runtime, &template_path).await?;

        let html = create_index_html(&IndexInputs {
            basepath: &self.options.basepath,
            build_info: info,
            template: &template,
            ssr: self.options.ssr,
            hashbang: self.options.hashbang,
            service_worker,
        })?;

        write_file_all(
            self.runtime,
            &self.options.dest.join("index.html"),
            html.as_bytes(),
        )
        .await?;
        Ok(())
    }
}
