//! Shared test utilities for sprout-build integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sprout_build::{
    BuildConfig, BuildMode, CompileError, CompileResult, CompileTarget, Compiler, CompilerFactory,
    CompilerOptions, CompilerSet,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Get the path to a specific fixture directory
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy a fixture project into a fresh temp directory
pub fn project_from_fixture(name: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    copy_dir(&fixture_path(name), temp.path());
    temp
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// Build config rooted at `dir` with an explicit bundler
pub fn config_for(dir: &Path, bundler: &str) -> BuildConfig {
    BuildConfig {
        cwd: Some(dir.to_path_buf()),
        bundler: Some(bundler.to_string()),
        ..Default::default()
    }
}

/// Compiler factory that writes canned chunks instead of running a bundler
#[derive(Debug, Default)]
pub struct FakeCompilers {
    calls: Mutex<Vec<CompilerOptions>>,
    fail: Vec<(CompileTarget, BuildMode)>,
}

impl FakeCompilers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail `target` in every build mode
    pub fn failing(target: CompileTarget) -> Arc<Self> {
        Arc::new(Self {
            fail: vec![(target, BuildMode::Modern), (target, BuildMode::Legacy)],
            ..Default::default()
        })
    }

    /// Fail `target` only when compiled in `mode`
    pub fn failing_in(target: CompileTarget, mode: BuildMode) -> Arc<Self> {
        Arc::new(Self {
            fail: vec![(target, mode)],
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<CompilerOptions> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompilerFactory for FakeCompilers {
    async fn create(&self, options: &CompilerOptions) -> sprout_build::Result<CompilerSet> {
        self.calls.lock().push(options.clone());

        let make = |target: CompileTarget| -> Box<dyn Compiler> {
            Box::new(FakeCompiler {
                target,
                options: options.clone(),
                fail: self.fail.contains(&(target, options.mode)),
            })
        };

        let service_worker = options
            .service_worker
            .is_some()
            .then(|| make(CompileTarget::ServiceWorker));

        Ok(CompilerSet::for_bundler(
            options.bundler,
            make(CompileTarget::Client),
            make(CompileTarget::Server),
            service_worker,
        ))
    }
}

#[derive(Debug)]
struct FakeCompiler {
    target: CompileTarget,
    options: CompilerOptions,
    fail: bool,
}

impl FakeCompiler {
    fn emit(dir: &Path, files: &[(&str, &str)]) -> Vec<String> {
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        files.iter().map(|(name, _)| name.to_string()).collect()
    }
}

#[async_trait]
impl Compiler for FakeCompiler {
    fn target(&self) -> CompileTarget {
        self.target
    }

    async fn compile(&self) -> Result<CompileResult, CompileError> {
        if self.fail {
            return Err(CompileError::new(self.target, "simulated failure")
                .with_diagnostics(vec!["src/routes/index.svelte: unexpected token".to_string()]));
        }

        let dest = &self.options.dest;
        let files = match (self.target, self.options.mode) {
            (CompileTarget::Client, BuildMode::Modern) => Self::emit(
                &dest.join("client"),
                &[
                    ("main.a1.js", "start('__SPROUT_ASSET:main__')"),
                    ("main.a1.js.map", "{}"),
                    ("main.a1.css", "body{}"),
                    ("index.b2.js", "export default 'index'"),
                ],
            ),
            (CompileTarget::Client, BuildMode::Legacy) => {
                Self::emit(&dest.join("client"), &[("legacy/main.c3.js", "legacy()")])
            }
            (CompileTarget::Server, _) => Self::emit(
                &dest.join("server"),
                &[("server.js", "const main = '__SPROUT_ASSET:main__';")],
            ),
            (CompileTarget::ServiceWorker, _) => {
                Self::emit(dest, &[("service-worker.js", "self.addEventListener")])
            }
        };

        let mut result = CompileResult::from_files(self.target, self.options.bundler, files);
        if (self.target, self.options.mode) == (CompileTarget::Client, BuildMode::Modern) {
            // What a source map for the page chunk would list.
            let page = self.options.src.join("routes/index.svelte");
            result.add_chunk_modules("index.b2.js", [page]);
        }
        Ok(result)
    }
}
