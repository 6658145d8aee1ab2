//! `sprout build`.

use parking_lot::Mutex;
use sprout_build::{Builder, CompileResult, NativeRuntime, Runtime, Stage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::BuildArgs;
use crate::config::{self, Overrides};
use crate::error::Result;
use crate::ui;

/// Files one stage emitted, captured while the build runs.
#[derive(Debug, Clone)]
struct StageOutput {
    stage: Stage,
    files: Vec<String>,
    duration: Duration,
}

/// Execute the build command.
///
/// 1. Load configuration (flags > env > sprout.toml > defaults)
/// 2. Run the build, reporting each stage as it completes
/// 3. Print a per-stage size summary
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();

    let config = config::load(&args.project, &Overrides::from_build(&args))?;

    let outputs: Arc<Mutex<Vec<StageOutput>>> = Arc::default();
    let recorder = Arc::clone(&outputs);

    let report = Builder::new()
        .observer(move |stage: Stage, result: &CompileResult| {
            for warning in &result.warnings {
                ui::warning(&format!("{stage}: {warning}"));
            }
            let files: Vec<String> = result.code_chunks().map(|c| c.file.clone()).collect();
            ui::success(&format!(
                "Compiled {stage} ({} files) in {}",
                files.len(),
                ui::format_duration(result.duration)
            ));
            recorder.lock().push(StageOutput {
                stage,
                files,
                duration: result.duration,
            });
            Ok(())
        })
        .build(&config)
        .await?;

    let outputs = outputs.lock().clone();
    let entries = summary_entries(&NativeRuntime, &report.options.dest, &outputs).await;
    ui::print_build_summary(&entries);

    ui::success(&format!(
        "Built {} in {}",
        report.options.dest.display(),
        ui::format_duration(start_time.elapsed())
    ));
    Ok(())
}

/// One summary row per stage: total size of its emitted code files.
///
/// Files that have gone missing since the stage ran count as zero.
async fn summary_entries(
    runtime: &dyn Runtime,
    dest: &Path,
    outputs: &[StageOutput],
) -> Vec<(String, u64, Duration)> {
    let mut entries = Vec::with_capacity(outputs.len());
    for output in outputs {
        let dir = stage_dir(dest, output.stage);
        let mut size = 0;
        for file in &output.files {
            if let Ok(metadata) = runtime.metadata(&dir.join(file)).await {
                size += metadata.size;
            }
        }
        entries.push((output.stage.to_string(), size, output.duration));
    }
    entries
}

/// Directory a stage's file names are relative to.
fn stage_dir(dest: &Path, stage: Stage) -> PathBuf {
    match stage {
        Stage::Client | Stage::LegacyClient => dest.join("client"),
        Stage::Server => dest.join("server"),
        Stage::ServiceWorker => dest.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_summary_entries_sum_stage_files() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path();
        std::fs::create_dir_all(dest.join("client/legacy")).unwrap();
        std::fs::create_dir_all(dest.join("server")).unwrap();
        std::fs::write(dest.join("client/main.a1.js"), "x".repeat(100)).unwrap();
        std::fs::write(dest.join("client/index.b2.js"), "x".repeat(20)).unwrap();
        std::fs::write(dest.join("client/legacy/main.c3.js"), "x".repeat(7)).unwrap();
        std::fs::write(dest.join("server/server.js"), "x".repeat(50)).unwrap();

        let output = |stage, files: &[&str]| StageOutput {
            stage,
            files: files.iter().map(|f| f.to_string()).collect(),
            duration: Duration::from_millis(10),
        };
        let outputs = [
            output(Stage::Client, &["main.a1.js", "index.b2.js", "gone.js"]),
            output(Stage::LegacyClient, &["legacy/main.c3.js"]),
            output(Stage::Server, &["server.js"]),
        ];

        let entries = summary_entries(&NativeRuntime, dest, &outputs).await;
        let sizes: Vec<(String, u64)> = entries
            .into_iter()
            .map(|(stage, size, _)| (stage, size))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (Stage::Client.to_string(), 120),
                (Stage::LegacyClient.to_string(), 7),
                (Stage::Server.to_string(), 50),
            ]
        );
    }

    #[test]
    fn test_stage_dir() {
        let dest = Path::new("/app/__sprout__/build");
        assert_eq!(stage_dir(dest, Stage::Client), dest.join("client"));
        assert_eq!(stage_dir(dest, Stage::LegacyClient), dest.join("client"));
        assert_eq!(stage_dir(dest, Stage::Server), dest.join("server"));
        assert_eq!(stage_dir(dest, Stage::ServiceWorker), dest);
    }
}
