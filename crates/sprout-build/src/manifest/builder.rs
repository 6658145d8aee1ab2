use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use tracing::{debug, trace};

use super::segment::{Part, append_static, compare_parts, component_name, parse_segment, route_pattern};
use super::{
    Component, ManifestData, PagePart, PageRoute, Param, RouteEntry, ServerRoute,
    ServiceWorkerEntry,
};
use crate::error::ManifestError;
use crate::runtime::{Runtime, RuntimeError};

/// Extensions recognised as endpoint modules.
const ENDPOINT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".ts"];

/// Stem of the service worker entry at the routes root.
const SERVICE_WORKER_STEM: &str = "service-worker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Dir,
    Page,
    Endpoint,
}

#[derive(Debug)]
struct Item {
    basename: String,
    /// Relative to the routes directory.
    file: String,
    kind: ItemKind,
    is_index: bool,
    /// Text after `index` in an index file stem, e.g. `.json`.
    index_suffix: String,
    parts: Vec<Part>,
}

#[derive(Debug, Default)]
struct Listing {
    items: Vec<Item>,
    layout: Option<String>,
    error: Option<String>,
}

/// Walk `routes_dir` and build the route manifest.
///
/// Files whose extension is in `ext` are pages, `.js`/`.mjs`/`.ts` files are
/// endpoints. Entries starting with `.` or `_` are skipped, except `_layout`
/// and `_error` pages. A `service-worker.js` (or `.mjs`/`.ts`) at the root is
/// recorded as the service worker entry instead of an endpoint.
pub async fn create_manifest_data(
    runtime: &dyn Runtime,
    routes_dir: &Path,
    ext: &[String],
) -> Result<ManifestData, ManifestError> {
    match runtime.metadata(routes_dir).await {
        Ok(meta) if meta.is_dir => {}
        Ok(_) | Err(RuntimeError::FileNotFound(_)) => {
            return Err(ManifestError::RoutesNotFound(routes_dir.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    }

    let (listings, service_worker) = scan(runtime, routes_dir, ext).await?;

    let mut walker = Walker {
        listings: &listings,
        data: ManifestData::default(),
        component_names: HashSet::new(),
        route_names: HashSet::new(),
        page_patterns: HashMap::new(),
        endpoint_patterns: HashMap::new(),
    };

    if let Some(root) = listings.get("") {
        if let Some(file) = &root.layout {
            walker.data.root = Some(walker.new_component(file));
        }
        if let Some(file) = &root.error {
            walker.data.error = Some(walker.new_component(file));
        }
    }

    walker.walk("", &[], &[], &[])?;

    let mut data = walker.data;
    if let Some(file) = service_worker {
        data.entries
            .push(RouteEntry::ServiceWorker(ServiceWorkerEntry { file }));
    }

    debug!(
        pages = data.pages().count(),
        server_routes = data.server_routes.len(),
        components = data.components.len(),
        service_worker = data.service_worker().is_some(),
        "Route manifest created"
    );

    Ok(data)
}

/// Read every directory under the routes root into sorted listings.
async fn scan(
    runtime: &dyn Runtime,
    routes_dir: &Path,
    ext: &[String],
) -> Result<(HashMap<String, Listing>, Option<String>), ManifestError> {
    let mut listings = HashMap::new();
    let mut service_worker: Option<String> = None;
    let mut pending = vec![String::new()];

    while let Some(dir) = pending.pop() {
        let dir_path = if dir.is_empty() {
            routes_dir.to_path_buf()
        } else {
            routes_dir.join(&dir)
        };
        let mut listing = Listing::default();

        for basename in runtime.read_dir(&dir_path).await? {
            if basename.starts_with('.') {
                continue;
            }

            let file = if dir.is_empty() {
                basename.clone()
            } else {
                format!("{}/{}", dir, basename)
            };

            if runtime.metadata(&dir_path.join(&basename)).await?.is_dir {
                if basename.starts_with('_') {
                    trace!(file = %file, "Skipping private directory");
                    continue;
                }
                let parts = parse_segment(&basename, &file)?;
                pending.push(file.clone());
                listing.items.push(Item {
                    basename,
                    file,
                    kind: ItemKind::Dir,
                    is_index: false,
                    index_suffix: String::new(),
                    parts,
                });
                continue;
            }

            let Some(dot) = basename.rfind('.').filter(|dot| *dot > 0) else {
                continue;
            };
            let (stem, extension) = basename.split_at(dot);

            let kind = if ext.iter().any(|e| e == extension) {
                ItemKind::Page
            } else if ENDPOINT_EXTENSIONS.contains(&extension) {
                ItemKind::Endpoint
            } else {
                trace!(file = %file, "Skipping file with unrecognised extension");
                continue;
            };

            if dir.is_empty() && kind == ItemKind::Endpoint && stem == SERVICE_WORKER_STEM {
                if let Some(existing) = service_worker.take() {
                    return Err(ManifestError::DuplicateServiceWorker {
                        a: existing,
                        b: file,
                    });
                }
                service_worker = Some(file);
                continue;
            }

            if stem.starts_with('_') {
                match (kind, stem) {
                    (ItemKind::Page, "_layout") => listing.layout = Some(file),
                    (ItemKind::Page, "_error") => listing.error = Some(file),
                    _ => trace!(file = %file, "Skipping private file"),
                }
                continue;
            }

            let is_index = stem == "index" || stem.starts_with("index.");
            let (index_suffix, parts) = if is_index {
                (stem["index".len()..].to_string(), Vec::new())
            } else {
                (String::new(), parse_segment(stem, &file)?)
            };

            listing.items.push(Item {
                basename: basename.clone(),
                file,
                kind,
                is_index,
                index_suffix,
                parts,
            });
        }

        listing.items.sort_by(|a, b| {
            compare_parts(a.is_index, &a.parts, b.is_index, &b.parts)
                .then_with(|| (a.kind == ItemKind::Dir).cmp(&(b.kind == ItemKind::Dir)))
                .then_with(|| a.basename.cmp(&b.basename))
        });
        listings.insert(dir, listing);
    }

    Ok((listings, service_worker))
}

struct Walker<'a> {
    listings: &'a HashMap<String, Listing>,
    data: ManifestData,
    component_names: HashSet<String>,
    route_names: HashSet<String>,
    /// Pattern to the file that claimed it.
    page_patterns: HashMap<String, String>,
    endpoint_patterns: HashMap<String, String>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        dir: &str,
        segments: &[Vec<Part>],
        params: &[Param],
        stack: &[Option<PagePart>],
    ) -> Result<(), ManifestError> {
        let listings = self.listings;
        let Some(listing) = listings.get(dir) else {
            return Ok(());
        };

        for item in &listing.items {
            let mut item_segments = segments.to_vec();
            let mut item_params = params.to_vec();

            if item.is_index {
                if !item.index_suffix.is_empty() {
                    match item_segments.last_mut() {
                        Some(last) => append_static(last, &item.index_suffix),
                        None => item_segments
                            .push(vec![Part::fixed(&format!("index{}", item.index_suffix))]),
                    }
                }
            } else {
                item_params.extend(item.parts.iter().filter(|p| p.dynamic).map(|p| Param {
                    name: p.content.clone(),
                    spread: p.spread,
                }));
                item_segments.push(item.parts.clone());
            }

            match item.kind {
                ItemKind::Dir => {
                    let layout = listings
                        .get(&item.file)
                        .and_then(|child| child.layout.as_deref());
                    let mut child_stack = stack.to_vec();
                    child_stack.push(layout.map(|file| PagePart {
                        component: self.add_component(file),
                        params: item_params.clone(),
                    }));
                    self.walk(&item.file, &item_segments, &item_params, &child_stack)?;
                }
                ItemKind::Page => {
                    let pattern = route_pattern(&item_segments, true);
                    check_pattern(&mut self.page_patterns, &pattern, &item.file)?;

                    let mut parts = stack.to_vec();
                    parts.push(Some(PagePart {
                        component: self.add_component(&item.file),
                        params: item_params,
                    }));
                    self.data
                        .entries
                        .push(RouteEntry::Page(PageRoute { pattern, parts }));
                }
                ItemKind::Endpoint => {
                    let pattern = route_pattern(&item_segments, false);
                    check_pattern(&mut self.endpoint_patterns, &pattern, &item.file)?;

                    let name = unique_name(
                        &mut self.route_names,
                        format!("route_{}", component_name(&item.file)),
                    );
                    self.data.server_routes.push(ServerRoute {
                        name,
                        pattern,
                        file: item.file.clone(),
                        params: item_params,
                    });
                }
            }
        }

        Ok(())
    }

    fn new_component(&mut self, file: &str) -> Component {
        Component {
            name: unique_name(&mut self.component_names, component_name(file)),
            file: file.to_string(),
        }
    }

    fn add_component(&mut self, file: &str) -> usize {
        let component = self.new_component(file);
        self.data.components.push(component);
        self.data.components.len() - 1
    }
}

/// Reject patterns that fail to compile or were already claimed.
fn check_pattern(
    claimed: &mut HashMap<String, String>,
    pattern: &str,
    file: &str,
) -> Result<(), ManifestError> {
    if let Err(e) = Regex::new(pattern) {
        return Err(ManifestError::InvalidSegment {
            file: file.to_string(),
            reason: format!("invalid parameter qualifier: {}", e),
        });
    }

    if let Some(existing) = claimed.get(pattern) {
        return Err(ManifestError::RouteClash {
            a: existing.clone(),
            b: file.to_string(),
        });
    }

    claimed.insert(pattern.to_string(), file.to_string());
    Ok(())
}

fn unique_name(taken: &mut HashSet<String>, base: String) -> String {
    let mut name = base.clone();
    let mut n = 1;
    while taken.contains(&name) {
        name = format!("{}_{}", base, n);
        n += 1;
    }
    taken.insert(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::NativeRuntime;
    use tempfile::TempDir;

    fn touch(root: &Path, files: &[&str]) {
        for file in files {
            let path = root.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }
    }

    fn ext() -> Vec<String> {
        vec![".svelte".to_string(), ".html".to_string()]
    }

    async fn manifest(files: &[&str]) -> Result<ManifestData, ManifestError> {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), files);
        create_manifest_data(&NativeRuntime, temp.path(), &ext()).await
    }

    fn page_files(data: &ManifestData) -> Vec<String> {
        data.pages()
            .map(|page| data.components[page.page().unwrap().component].file.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_missing_routes_dir() {
        let temp = TempDir::new().unwrap();
        let err = create_manifest_data(&NativeRuntime, &temp.path().join("routes"), &ext())
            .await
            .unwrap_err();
        assert!(matches!(err, ManifestError::RoutesNotFound(_)));
    }

    #[tokio::test]
    async fn test_pages_endpoints_and_service_worker() {
        let data = manifest(&[
            "index.svelte",
            "about.svelte",
            "blog/index.svelte",
            "blog/[slug].svelte",
            "blog/[slug].json.js",
            "blog/index.json.js",
            "service-worker.js",
            "_layout.svelte",
            "_error.svelte",
            "_helpers.js",
            ".DS_Store",
            "notes.md",
        ])
        .await
        .unwrap();

        assert_eq!(
            page_files(&data),
            vec![
                "index.svelte",
                "about.svelte",
                "blog/index.svelte",
                "blog/[slug].svelte"
            ]
        );
        assert_eq!(data.root.as_ref().unwrap().file, "_layout.svelte");
        assert_eq!(data.error.as_ref().unwrap().name, "_error");
        assert_eq!(data.service_worker().unwrap().file, "service-worker.js");

        let routes: Vec<_> = data.server_routes.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(routes, vec!["blog/index.json.js", "blog/[slug].json.js"]);
        assert!(data.server_routes[0].is_match("/blog.json"));
        assert!(data.server_routes[1].is_match("/blog/hello.json"));
        assert_eq!(data.server_routes[1].params[0].name, "slug");

        let slug = data.match_page("/blog/hello-world").unwrap();
        assert_eq!(slug.page().unwrap().params[0].name, "slug");
        assert!(data.match_page("/").is_some());
        assert!(data.match_page("/about/").is_some());
    }

    #[tokio::test]
    async fn test_static_before_dynamic_before_rest() {
        let data = manifest(&["[...path].svelte", "[slug].svelte", "about.svelte"])
            .await
            .unwrap();
        assert_eq!(
            page_files(&data),
            vec!["about.svelte", "[slug].svelte", "[...path].svelte"]
        );
        assert_eq!(
            data.match_page("/about").map(|p| p.pattern.as_str()),
            Some("^\\/about\\/?$")
        );
        assert!(data.match_page("/a/b/c").unwrap().page().unwrap().params[0].spread);
    }

    #[tokio::test]
    async fn test_layout_chain() {
        let data = manifest(&[
            "settings/_layout.svelte",
            "settings/profile.svelte",
            "docs/page.svelte",
        ])
        .await
        .unwrap();

        let profile = data.match_page("/settings/profile").unwrap();
        assert_eq!(profile.parts.len(), 2);
        let layout = profile.parts[0].as_ref().unwrap();
        assert_eq!(data.components[layout.component].name, "settings__layout");

        let docs = data.match_page("/docs/page").unwrap();
        assert_eq!(docs.parts.len(), 2);
        assert!(docs.parts[0].is_none());
    }

    #[tokio::test]
    async fn test_identical_patterns_clash() {
        let err = manifest(&["about.svelte", "about/index.svelte"])
            .await
            .unwrap_err();
        assert!(matches!(err, ManifestError::RouteClash { .. }));

        let err = manifest(&["[a].svelte", "[b].html"]).await.unwrap_err();
        assert!(matches!(err, ManifestError::RouteClash { .. }));
    }

    #[tokio::test]
    async fn test_page_and_endpoint_may_share_pattern_space() {
        let data = manifest(&["about.svelte", "about.js"]).await.unwrap();
        assert_eq!(data.pages().count(), 1);
        assert_eq!(data.server_routes.len(), 1);
    }

    #[tokio::test]
    async fn test_two_service_workers_rejected() {
        let err = manifest(&["service-worker.js", "service-worker.ts"])
            .await
            .unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateServiceWorker { .. }));
    }

    #[tokio::test]
    async fn test_nested_service_worker_is_an_endpoint() {
        let data = manifest(&["api/service-worker.js"]).await.unwrap();
        assert!(data.service_worker().is_none());
        assert_eq!(data.server_routes.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_qualifier_rejected() {
        let err = manifest(&["[id((]+)].svelte"]).await.unwrap_err();
        assert!(matches!(err, ManifestError::InvalidSegment { .. }));
    }

    #[tokio::test]
    async fn test_custom_extensions() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["index.svx", "about.svelte"]);
        let data = create_manifest_data(&NativeRuntime, temp.path(), &[".svx".to_string()])
            .await
            .unwrap();
        assert_eq!(page_files(&data), vec!["index.svx"]);
    }
}
