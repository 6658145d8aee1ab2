//! Compiler abstraction.
//!
//! A build drives up to three compilers (client, server, service worker)
//! obtained from a [`CompilerFactory`]. The default factory,
//! [`ToolchainCompilers`], shells out to the project's rollup or webpack; tests
//! and embedders can plug in their own.

mod inject;
mod result;
mod toolchain;

pub use inject::inject_resources;
pub use result::{BuildInfo, BuildPaths, Chunk, CompileResult, logical_name};
pub use toolchain::ToolchainCompilers;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

use crate::error::CompileError;
use crate::options::Bundler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileTarget {
    Client,
    Server,
    ServiceWorker,
}

impl CompileTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileTarget::Client => "client",
            CompileTarget::Server => "server",
            CompileTarget::ServiceWorker => "serviceworker",
        }
    }
}

impl fmt::Display for CompileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which flavour of client bundle a compiler set produces.
///
/// Passed explicitly to the factory; nothing about it leaks into the
/// orchestrator's own process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Modern,
    /// `nomodule` client bundle for browsers without ES module support.
    Legacy,
}

/// Everything a factory needs to configure compilers for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub bundler: Bundler,
    pub cwd: PathBuf,
    pub src: PathBuf,
    pub dest: PathBuf,
    pub dev: bool,
    pub mode: BuildMode,
    /// Service worker entry discovered in the routes directory.
    pub service_worker: Option<PathBuf>,
}

/// One compiler stage.
#[async_trait]
pub trait Compiler: Send + Sync + fmt::Debug {
    fn target(&self) -> CompileTarget;

    /// Run the compilation. Output lands under the build destination.
    async fn compile(&self) -> Result<CompileResult, CompileError>;
}

/// The compilers for one build.
#[derive(Debug)]
pub struct CompilerSet {
    pub client: Box<dyn Compiler>,
    pub server: Box<dyn Compiler>,
    pub service_worker: Option<Box<dyn Compiler>>,
    needs_manifest_injection: bool,
}

impl CompilerSet {
    pub fn new(
        client: Box<dyn Compiler>,
        server: Box<dyn Compiler>,
        service_worker: Option<Box<dyn Compiler>>,
        needs_manifest_injection: bool,
    ) -> Self {
        Self {
            client,
            server,
            service_worker,
            needs_manifest_injection,
        }
    }

    /// A set whose injection behaviour follows the bundler's conventions.
    pub fn for_bundler(
        bundler: Bundler,
        client: Box<dyn Compiler>,
        server: Box<dyn Compiler>,
        service_worker: Option<Box<dyn Compiler>>,
    ) -> Self {
        Self::new(
            client,
            server,
            service_worker,
            bundler.needs_manifest_injection(),
        )
    }

    /// Whether emitted chunks must be rewritten once `build.json` exists.
    pub fn needs_manifest_injection(&self) -> bool {
        self.needs_manifest_injection
    }
}

/// Creates compiler sets.
#[async_trait]
pub trait CompilerFactory: Send + Sync + fmt::Debug {
    async fn create(&self, options: &CompilerOptions) -> crate::Result<CompilerSet>;
}
