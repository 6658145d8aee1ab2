use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::CompileTarget;
use crate::manifest::ManifestData;
use crate::options::Bundler;

/// An emitted file, relative to the compiler's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub file: String,
    /// Source map emitted alongside this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
}

impl Chunk {
    pub fn is_source_map(&self) -> bool {
        self.file.ends_with(".map")
    }
}

/// Logical name of an emitted file: its basename up to the first `.`.
///
/// Client files are named `[name].[hash].ext`, so `legacy/main.a1b2c3.js`
/// maps to `main` and `service-worker.js` to `service-worker`.
pub fn logical_name(file: &str) -> &str {
    let basename = file.rsplit('/').next().unwrap_or(file);
    basename
        .split('.')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(basename)
}

/// Outcome of one compiler stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    pub target: CompileTarget,
    pub bundler: Bundler,
    /// Every emitted file in sorted order, source maps included.
    pub chunks: Vec<Chunk>,
    /// Logical name to emitted file.
    pub assets: BTreeMap<String, String>,
    /// Chunk names the bundler reported, with their emitted code files.
    pub named_chunks: BTreeMap<String, Vec<String>>,
    /// Source module to the code chunks that bundle it.
    pub module_chunks: BTreeMap<PathBuf, Vec<String>>,
    pub warnings: Vec<String>,
    pub duration: Duration,
}

impl CompileResult {
    pub fn new(target: CompileTarget, bundler: Bundler) -> Self {
        Self {
            target,
            bundler,
            chunks: Vec::new(),
            assets: BTreeMap::new(),
            named_chunks: BTreeMap::new(),
            module_chunks: BTreeMap::new(),
            warnings: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Build a result from emitted file names.
    ///
    /// Chunks pair with their `.map` sibling; JavaScript files register under
    /// their logical name and stylesheets under `<name>.css`. The first file
    /// in sorted order wins when two share a logical name.
    pub fn from_files(target: CompileTarget, bundler: Bundler, mut files: Vec<String>) -> Self {
        files.sort();
        files.dedup();

        let mut result = Self::new(target, bundler);
        for file in &files {
            let map = format!("{}.map", file);
            result.chunks.push(Chunk {
                file: file.clone(),
                map: files.binary_search(&map).is_ok().then_some(map),
            });

            let key = if file.ends_with(".js") || file.ends_with(".mjs") {
                logical_name(file).to_string()
            } else if file.ends_with(".css") {
                format!("{}.css", logical_name(file))
            } else {
                continue;
            };
            result.assets.entry(key).or_insert_with(|| file.clone());
        }
        result
    }

    /// Record files the bundler emitted for a named chunk.
    pub fn add_named_chunk(&mut self, name: &str, files: impl IntoIterator<Item = String>) {
        let entry = self.named_chunks.entry(name.to_string()).or_default();
        entry.extend(files);
        entry.sort();
        entry.dedup();
    }

    /// Record that `chunk` bundles each of `modules`.
    pub fn add_chunk_modules(&mut self, chunk: &str, modules: impl IntoIterator<Item = PathBuf>) {
        for module in modules {
            let chunks = self.module_chunks.entry(module).or_default();
            if !chunks.iter().any(|c| c == chunk) {
                chunks.push(chunk.to_string());
                chunks.sort();
            }
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Chunks a browser would actually fetch.
    pub fn code_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().filter(|chunk| !chunk.is_source_map())
    }

    /// Fold route and asset information into the artifact manifest.
    ///
    /// Components are keyed by their source path relative to `src`. Their
    /// chunks come from the bundler's own reporting: the chunk named after
    /// the component, else the chunks whose source maps list its file.
    /// A component the bundler said nothing about is left out.
    pub fn to_json(&self, manifest: &ManifestData, paths: &BuildPaths) -> BuildInfo {
        let mut components = BTreeMap::new();
        for component in manifest.all_components() {
            let files = self
                .named_chunks
                .get(&component.name)
                .or_else(|| self.module_chunks.get(&paths.routes.join(&component.file)))
                .cloned()
                .unwrap_or_default();
            if !files.is_empty() {
                components.insert(paths.component_key(&component.file), files);
            }
        }

        BuildInfo {
            bundler: self.bundler,
            assets: self.assets.clone(),
            chunks: self.chunks.iter().map(|chunk| chunk.file.clone()).collect(),
            components,
            legacy_assets: None,
        }
    }
}

/// Directories `to_json` resolves component paths against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    pub src: PathBuf,
    pub routes: PathBuf,
}

impl BuildPaths {
    /// `routes/blog/[slug].svelte` for a routes-relative `blog/[slug].svelte`.
    fn component_key(&self, file: &str) -> String {
        let path = self.routes.join(file);
        match path.strip_prefix(&self.src) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => file.to_string(),
        }
    }
}

/// The artifact manifest persisted as `build.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub bundler: Bundler,
    pub assets: BTreeMap<String, String>,
    pub chunks: Vec<String>,
    #[serde(default)]
    pub components: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_assets: Option<BTreeMap<String, String>>,
}

impl BuildInfo {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
