//! Post-build rewriting of emitted chunks.
//!
//! Rollup cannot know final chunk names while it is still emitting them, so
//! generated code refers to them through placeholders that are filled in once
//! `build.json` exists:
//!
//! - `__SPROUT_ASSET:<name>__` becomes the emitted file for logical asset `<name>`
//! - `__SPROUT_CHUNKS:<component>__` becomes a JSON array of the chunks built
//!   for a component, keyed by its source path (e.g. `routes/index.svelte`)
//!
//! Chunks under `legacy/` resolve assets against `legacy_assets`.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::BuildInfo;
use crate::Result;
use crate::runtime::{Runtime, list_files, read_to_string};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__SPROUT_(ASSET|CHUNKS):([\w$./\[\]\-]+?)__").expect("placeholder pattern is valid")
});

/// Rewrite placeholders in every JavaScript file under `chunk_dir`.
///
/// Returns the number of files that changed. Unknown names are left in
/// place and logged.
pub async fn inject_resources(
    runtime: &dyn Runtime,
    manifest_path: &Path,
    chunk_dir: &Path,
) -> Result<usize> {
    let info = BuildInfo::from_json_slice(&runtime.read_file(manifest_path).await?)?;

    if !runtime.exists(chunk_dir) {
        debug!(dir = %chunk_dir.display(), "No chunks to inject into");
        return Ok(0);
    }

    let mut rewritten = 0;
    for file in list_files(runtime, chunk_dir).await? {
        if !(file.ends_with(".js") || file.ends_with(".mjs")) {
            continue;
        }

        let path = chunk_dir.join(&file);
        let source = read_to_string(runtime, &path).await?;
        let replaced = replace_placeholders(&info, &source, file.starts_with("legacy/"));

        if replaced != source {
            runtime.write_file(&path, replaced.as_bytes()).await?;
            rewritten += 1;
        }
    }

    debug!(dir = %chunk_dir.display(), rewritten, "Injected build info into chunks");
    Ok(rewritten)
}

fn replace_placeholders(info: &BuildInfo, source: &str, legacy: bool) -> String {
    PLACEHOLDER
        .replace_all(source, |caps: &Captures<'_>| {
            let name = &caps[2];
            let resolved = match &caps[1] {
                "ASSET" => {
                    let assets = if legacy {
                        info.legacy_assets.as_ref().unwrap_or(&info.assets)
                    } else {
                        &info.assets
                    };
                    assets.get(name).cloned()
                }
                _ => info
                    .components
                    .get(name)
                    .and_then(|chunks| serde_json::to_string(chunks).ok()),
            };

            resolved.unwrap_or_else(|| {
                warn!(placeholder = &caps[0], "No build info entry for placeholder");
                caps[0].to_string()
            })
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Bundler;
    use crate::runtime::NativeRuntime;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn info() -> BuildInfo {
        BuildInfo {
            bundler: Bundler::Rollup,
            assets: BTreeMap::from([("main".to_string(), "main.abc.js".to_string())]),
            chunks: vec!["main.abc.js".to_string(), "index.1.js".to_string()],
            components: BTreeMap::from([(
                "routes/index.svelte".to_string(),
                vec!["index.1.js".to_string()],
            )]),
            legacy_assets: Some(BTreeMap::from([(
                "main".to_string(),
                "legacy/main.old.js".to_string(),
            )])),
        }
    }

    #[test]
    fn test_replaces_assets_and_chunks() {
        let out = replace_placeholders(
            &info(),
            r#"import("./__SPROUT_ASSET:main__"); const c = __SPROUT_CHUNKS:routes/index.svelte__;"#,
            false,
        );
        assert_eq!(out, r#"import("./main.abc.js"); const c = ["index.1.js"];"#);
    }

    #[test]
    fn test_legacy_chunks_use_legacy_assets() {
        let out = replace_placeholders(&info(), "__SPROUT_ASSET:main__", true);
        assert_eq!(out, "legacy/main.old.js");
    }

    #[test]
    fn test_unknown_placeholder_left_alone() {
        let out = replace_placeholders(&info(), "x = '__SPROUT_ASSET:nope__'", false);
        assert_eq!(out, "x = '__SPROUT_ASSET:nope__'");
    }

    #[tokio::test]
    async fn test_inject_rewrites_only_changed_files() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("build.json");
        std::fs::write(&manifest, info().to_json_string().unwrap()).unwrap();

        let chunks = temp.path().join("client");
        std::fs::create_dir_all(&chunks).unwrap();
        std::fs::write(chunks.join("main.abc.js"), "load('__SPROUT_ASSET:main__')").unwrap();
        std::fs::write(chunks.join("index.1.js"), "export default 1").unwrap();
        std::fs::write(chunks.join("main.css"), "__SPROUT_ASSET:main__").unwrap();

        let count = inject_resources(&NativeRuntime, &manifest, &chunks)
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            std::fs::read_to_string(chunks.join("main.abc.js")).unwrap(),
            "load('main.abc.js')"
        );
        assert_eq!(
            std::fs::read_to_string(chunks.join("main.css")).unwrap(),
            "__SPROUT_ASSET:main__"
        );
    }
}
