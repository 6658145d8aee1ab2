//! `sprout routes`.

use owo_colors::OwoColorize;
use sprout_build::{ManifestData, NativeRuntime, create_manifest_data};

use crate::cli::RoutesArgs;
use crate::config::{self, Overrides};
use crate::error::Result;

/// Print the route table in match order.
pub async fn execute(args: RoutesArgs) -> Result<()> {
    let config = config::load(&args.project, &Overrides::from_project(&args.project))?;
    let (routes_dir, ext) = config.route_source().map_err(sprout_build::Error::from)?;

    let manifest = create_manifest_data(&NativeRuntime, &routes_dir, &ext)
        .await
        .map_err(sprout_build::Error::from)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        for line in route_table(&manifest) {
            println!("{line}");
        }
    }
    Ok(())
}

/// One line per page, server route and service worker.
fn route_table(manifest: &ManifestData) -> Vec<String> {
    let mut lines = Vec::new();

    for page in manifest.pages() {
        let chain: Vec<&str> = page
            .parts
            .iter()
            .flatten()
            .filter_map(|part| manifest.components.get(part.component))
            .map(|component| component.file.as_str())
            .collect();
        lines.push(format!(
            "{} {} {}",
            "page".green(),
            page.pattern,
            chain.join(" > ").dimmed()
        ));
    }

    for route in &manifest.server_routes {
        lines.push(format!(
            "{} {} {}",
            "server".cyan(),
            route.pattern,
            route.file.dimmed()
        ));
    }

    if let Some(sw) = manifest.service_worker() {
        lines.push(format!("{} {}", "service-worker".magenta(), sw.file));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_build::manifest::{Component, PagePart, PageRoute, RouteEntry, ServerRoute};

    #[test]
    fn test_route_table_lists_pages_then_server_routes() {
        let manifest = ManifestData {
            components: vec![
                Component {
                    name: "blog__layout".to_string(),
                    file: "blog/_layout.svelte".to_string(),
                },
                Component {
                    name: "blog_$slug".to_string(),
                    file: "blog/[slug].svelte".to_string(),
                },
            ],
            entries: vec![RouteEntry::Page(PageRoute {
                pattern: r"^\/blog\/([^\/]+?)\/?$".to_string(),
                parts: vec![
                    Some(PagePart {
                        component: 0,
                        params: vec![],
                    }),
                    Some(PagePart {
                        component: 1,
                        params: vec![],
                    }),
                ],
            })],
            server_routes: vec![ServerRoute {
                name: "route_api".to_string(),
                pattern: r"^\/api$".to_string(),
                file: "api.js".to_string(),
                params: vec![],
            }],
            ..Default::default()
        };

        let lines = route_table(&manifest);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("blog/_layout.svelte"));
        assert!(lines[0].contains("blog/[slug].svelte"));
        assert!(lines[1].contains("api.js"));
    }
}
