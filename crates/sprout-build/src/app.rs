//! Framework glue written into the output directory.
//!
//! Two things land there before any compiler runs: the runtime support files
//! embedded in this crate, and the manifests generated from the route tree
//! that tie the runtime to the user's components.

use rust_embed::RustEmbed;
use std::path::{Component as PathComponent, Path};
use tracing::debug;

use crate::Result;
use crate::manifest::{Component, ManifestData, Param};
use crate::options::Bundler;
use crate::runtime::{Runtime, write_file_all};
use crate::service_worker::json_string;

const GENERATED_HEADER: &str = "// This file is generated by sprout. Do not edit it.\n\n";

#[derive(RustEmbed)]
#[folder = "assets/runtime/"]
struct RuntimeFiles;

/// Copy the runtime support files into `output`.
///
/// Without server-side rendering the static server runtime is installed as
/// `server.mjs`. Returns the number of files written.
pub async fn copy_runtime(runtime: &dyn Runtime, output: &Path, ssr: bool) -> Result<usize> {
    let mut names: Vec<String> = RuntimeFiles::iter().map(|name| name.into_owned()).collect();
    names.sort();

    let mut written = 0;
    for name in names {
        let target = match (name.as_str(), ssr) {
            ("server.mjs", false) | ("server-static.mjs", true) => continue,
            ("server-static.mjs", false) => "server.mjs",
            (other, _) => other,
        };
        let Some(file) = RuntimeFiles::get(&name) else {
            continue;
        };

        write_file_all(runtime, &output.join(target), &file.data).await?;
        written += 1;
    }

    debug!(output = %output.display(), written, ssr, "Copied runtime files");
    Ok(written)
}

/// Inputs for [`create_app`].
#[derive(Debug, Clone, Copy)]
pub struct AppOptions<'a> {
    pub manifest: &'a ManifestData,
    pub cwd: &'a Path,
    pub src: &'a Path,
    pub routes: &'a Path,
    pub output: &'a Path,
    pub dest: &'a Path,
    pub bundler: Bundler,
    pub hashbang: bool,
    pub dev: bool,
}

/// Write `internal/manifest-client.mjs` and `internal/manifest-server.mjs`
/// into the output directory.
pub async fn create_app(runtime: &dyn Runtime, options: &AppOptions<'_>) -> Result<()> {
    let internal = options.output.join("internal");

    write_file_all(
        runtime,
        &internal.join("manifest-client.mjs"),
        client_manifest(options).as_bytes(),
    )
    .await?;
    write_file_all(
        runtime,
        &internal.join("manifest-server.mjs"),
        server_manifest(options).as_bytes(),
    )
    .await?;

    debug!(output = %options.output.display(), "Generated app manifests");
    Ok(())
}

fn client_manifest(options: &AppOptions<'_>) -> String {
    let manifest = options.manifest;
    let import = |component: &Component| dynamic_import(options, component);
    let mut out = String::from(GENERATED_HEADER);

    out.push_str(&format!("export const hashbang = {};\n\n", options.hashbang));

    let ignore: Vec<String> = manifest
        .server_routes
        .iter()
        .map(|route| format!("/{}/", route.pattern))
        .collect();
    out.push_str(&format!("export const ignore = [{}];\n\n", ignore.join(", ")));

    out.push_str("export const components = [\n");
    for component in &manifest.components {
        out.push_str(&format!(
            "\t{{ js: () => {} }},\n",
            import(component)
        ));
    }
    out.push_str("];\n\n");

    out.push_str("export const routes = (d => [\n");
    for page in manifest.pages() {
        let file = page
            .page()
            .map(|part| manifest.components[part.component].file.as_str())
            .unwrap_or_default();
        out.push_str(&format!("\t{{\n\t\t// {}\n\t\tpattern: /{}/,\n\t\tparts: [\n", file, page.pattern));
        for part in &page.parts {
            match part {
                None => out.push_str("\t\t\tnull,\n"),
                Some(part) if part.params.is_empty() => {
                    out.push_str(&format!("\t\t\t{{ i: {} }},\n", part.component));
                }
                Some(part) => out.push_str(&format!(
                    "\t\t\t{{ i: {}, params: match => ({}) }},\n",
                    part.component,
                    params_object(&part.params)
                )),
            }
        }
        out.push_str("\t\t]\n\t},\n");
    }
    out.push_str("])(decodeURIComponent);\n\n");

    match &manifest.root {
        Some(root) => out.push_str(&format!(
            "export const root_comp = {{ js: () => {} }};\n",
            import(root)
        )),
        None => out.push_str("export const root_comp = null;\n"),
    }
    match &manifest.error {
        Some(error) => out.push_str(&format!(
            "export const ErrorComponent = {{ js: () => {} }};\n",
            import(error)
        )),
        None => out.push_str("export const ErrorComponent = null;\n"),
    }

    out
}

fn server_manifest(options: &AppOptions<'_>) -> String {
    let manifest = options.manifest;
    let import = |file: &str| json_string(&import_path(options, file));
    let mut out = String::from(GENERATED_HEADER);

    for route in &manifest.server_routes {
        out.push_str(&format!(
            "import * as {} from {};\n",
            route.name,
            import(&route.file)
        ));
    }
    for (i, component) in manifest.components.iter().enumerate() {
        out.push_str(&format!(
            "import component_{} from {};\n",
            i,
            import(&component.file)
        ));
    }
    match &manifest.root {
        Some(root) => out.push_str(&format!("import root from {};\n", import(&root.file))),
        None => out.push_str("const root = null;\n"),
    }
    match &manifest.error {
        Some(error) => out.push_str(&format!("import error from {};\n", import(&error.file))),
        None => out.push_str("const error = null;\n"),
    }

    out.push_str("\nconst d = decodeURIComponent;\n\nexport const manifest = {\n\tserver_routes: [\n");
    for route in &manifest.server_routes {
        out.push_str(&format!(
            "\t\t{{\n\t\t\t// {}\n\t\t\tpattern: /{}/,\n\t\t\thandlers: {},\n\t\t\tparams: match => ({})\n\t\t}},\n",
            route.file,
            route.pattern,
            route.name,
            params_object(&route.params)
        ));
    }
    out.push_str("\t],\n\n\tpages: [\n");
    for page in manifest.pages() {
        out.push_str(&format!("\t\t{{\n\t\t\tpattern: /{}/,\n\t\t\tparts: [\n", page.pattern));
        for part in &page.parts {
            match part {
                None => out.push_str("\t\t\t\tnull,\n"),
                Some(part) => {
                    let component = &manifest.components[part.component];
                    out.push_str(&format!(
                        "\t\t\t\t{{ name: {}, file: {}, component: component_{}, params: match => ({}) }},\n",
                        json_string(&component.name),
                        json_string(&component.file),
                        part.component,
                        params_object(&part.params)
                    ));
                }
            }
        }
        out.push_str("\t\t\t]\n\t\t},\n");
    }
    out.push_str("\t],\n\n\troot,\n\terror\n};\n\n");

    out.push_str(&format!(
        "export const build_dir = {};\nexport const src_dir = {};\nexport const dev = {};\n",
        json_string(&project_relative(options.cwd, options.dest)),
        json_string(&project_relative(options.cwd, options.src)),
        options.dev
    ));

    out
}

/// Lazy import of a component. Webpack chunks are named after the
/// component so its stats can tie them back to the route.
fn dynamic_import(options: &AppOptions<'_>, component: &Component) -> String {
    let path = json_string(&import_path(options, &component.file));
    match options.bundler {
        Bundler::Webpack => format!(
            "import(/* webpackChunkName: {} */ {})",
            json_string(&component.name),
            path
        ),
        Bundler::Rollup => format!("import({})", path),
    }
}

/// `{ slug: d(match[1]), rest: d(match[2]).split('/') }`
fn params_object(params: &[Param]) -> String {
    if params.is_empty() {
        return "{}".to_string();
    }
    let fields: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            if param.spread {
                format!("{}: d(match[{}]).split('/')", param.name, i + 1)
            } else {
                format!("{}: d(match[{}])", param.name, i + 1)
            }
        })
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

/// Import specifier from `output/internal` to a routes-relative file.
fn import_path(options: &AppOptions<'_>, file: &str) -> String {
    relative_path(&options.output.join("internal"), &options.routes.join(file))
}

fn project_relative(cwd: &Path, path: &Path) -> String {
    match path.strip_prefix(cwd) {
        Ok(relative) => slash_join(relative),
        Err(_) => slash_join(path),
    }
}

fn slash_join(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative module path from directory `from` to `to`, always starting with
/// `./` or `../`.
fn relative_path(from: &Path, to: &Path) -> String {
    let from: Vec<PathComponent<'_>> = from.components().collect();
    let to: Vec<PathComponent<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = std::iter::repeat_n("..".to_string(), from.len() - common).collect();
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}
