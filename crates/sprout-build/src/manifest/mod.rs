//! Route manifest: the structured view of the routes directory.
//!
//! [`create_manifest_data`] walks the route tree once and produces a
//! [`ManifestData`] describing every page, server route, layout and the
//! optional service worker entry. Everything downstream (glue emission,
//! compiler setup, `build.json`, the service worker manifest) reads from it.

mod builder;
mod segment;

pub use builder::create_manifest_data;

use regex::Regex;
use serde::Serialize;

/// A component source file under the routes directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Identifier-safe name, unique within a manifest.
    pub name: String,
    /// Path relative to the routes directory, `/` separated.
    pub file: String,
}

/// A URL parameter captured by a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    /// `[...name]` parameters capture the rest of the path.
    pub spread: bool,
}

/// One level of a page's layout chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagePart {
    /// Index into [`ManifestData::components`].
    pub component: usize,
    /// Parameters known at this level, in capture-group order.
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRoute {
    /// Regex source matched against the URL path.
    pub pattern: String,
    /// Layout chain ending with the page itself. `None` marks a directory
    /// without its own layout.
    pub parts: Vec<Option<PagePart>>,
}

impl PageRoute {
    pub fn is_match(&self, path: &str) -> bool {
        Regex::new(&self.pattern).is_ok_and(|re| re.is_match(path))
    }

    /// The page component itself.
    pub fn page(&self) -> Option<&PagePart> {
        self.parts.last().and_then(Option::as_ref)
    }
}

/// An endpoint module handling requests for a URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRoute {
    pub name: String,
    pub pattern: String,
    pub file: String,
    pub params: Vec<Param>,
}

impl ServerRoute {
    pub fn is_match(&self, path: &str) -> bool {
        Regex::new(&self.pattern).is_ok_and(|re| re.is_match(path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceWorkerEntry {
    /// Path relative to the routes directory.
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteEntry {
    Page(PageRoute),
    ServiceWorker(ServiceWorkerEntry),
}

/// Result of walking the routes directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestData {
    /// Root `_layout` component.
    pub root: Option<Component>,
    /// Root `_error` component.
    pub error: Option<Component>,
    /// Page and nested layout components, in discovery order.
    pub components: Vec<Component>,
    /// Pages in match priority order, plus the service worker if present.
    pub entries: Vec<RouteEntry>,
    /// Endpoints in match priority order.
    pub server_routes: Vec<ServerRoute>,
}

impl ManifestData {
    pub fn pages(&self) -> impl Iterator<Item = &PageRoute> {
        self.entries.iter().filter_map(|entry| match entry {
            RouteEntry::Page(page) => Some(page),
            RouteEntry::ServiceWorker(_) => None,
        })
    }

    pub fn service_worker(&self) -> Option<&ServiceWorkerEntry> {
        self.entries.iter().find_map(|entry| match entry {
            RouteEntry::ServiceWorker(sw) => Some(sw),
            RouteEntry::Page(_) => None,
        })
    }

    /// Root layout, root error and every other component.
    pub fn all_components(&self) -> impl Iterator<Item = &Component> {
        self.root
            .iter()
            .chain(self.error.iter())
            .chain(self.components.iter())
    }

    /// First page whose pattern matches `path`.
    pub fn match_page(&self, path: &str) -> Option<&PageRoute> {
        self.pages().find(|page| page.is_match(path))
    }
}
