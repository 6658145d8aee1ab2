use std::fmt;
use std::time::Duration;

use super::Stage;

/// Steps of a build, in the order they can occur.
///
/// Optional phases are skipped rather than recorded when their condition
/// does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildPhase {
    Init,
    ResetOutputDirs,
    EmitGlue,
    CompileClient,
    /// Only with `legacy`.
    CompileLegacyClient,
    WriteManifest,
    /// Only for bundlers that need manifest injection.
    InjectClient,
    CompileServer,
    /// Only for bundlers that need manifest injection.
    InjectServer,
    /// Only when a service worker compiler exists.
    CompileServiceWorker,
    /// Only without server-side rendering.
    EmitStaticIndex,
    Done,
}

impl BuildPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPhase::Init => "init",
            BuildPhase::ResetOutputDirs => "reset-output-dirs",
            BuildPhase::EmitGlue => "emit-glue",
            BuildPhase::CompileClient => "compile-client",
            BuildPhase::CompileLegacyClient => "compile-legacy-client",
            BuildPhase::WriteManifest => "write-manifest",
            BuildPhase::InjectClient => "inject-client",
            BuildPhase::CompileServer => "compile-server",
            BuildPhase::InjectServer => "inject-server",
            BuildPhase::CompileServiceWorker => "compile-service-worker",
            BuildPhase::EmitStaticIndex => "emit-static-index",
            BuildPhase::Done => "done",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one completed compile stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub chunks: usize,
    pub warnings: usize,
    pub duration: Duration,
}
