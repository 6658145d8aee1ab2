use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::warn;

use crate::compile::CompileResult;

/// A compile stage reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Client,
    LegacyClient,
    Server,
    ServiceWorker,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Client => "client",
            Stage::LegacyClient => "client (legacy)",
            Stage::Server => "server",
            Stage::ServiceWorker => "serviceworker",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives each completed compile stage.
///
/// Observers cannot fail a build: errors and panics are logged and the build
/// carries on.
pub trait BuildObserver: Send + Sync {
    fn on_stage_complete(&self, stage: Stage, result: &CompileResult) -> anyhow::Result<()>;
}

impl<F> BuildObserver for F
where
    F: Fn(Stage, &CompileResult) -> anyhow::Result<()> + Send + Sync,
{
    fn on_stage_complete(&self, stage: Stage, result: &CompileResult) -> anyhow::Result<()> {
        self(stage, result)
    }
}

/// Observer that ignores every stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {
    fn on_stage_complete(&self, _stage: Stage, _result: &CompileResult) -> anyhow::Result<()> {
        Ok(())
    }
}

pub(crate) fn notify(observer: &dyn BuildObserver, stage: Stage, result: &CompileResult) {
    match catch_unwind(AssertUnwindSafe(|| observer.on_stage_complete(stage, result))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(%stage, error = %e, "Stage observer failed"),
        Err(_) => warn!(%stage, "Stage observer panicked"),
    }
}
