//! Precache manifest for the service worker.
//!
//! The generated module is imported by the user's service worker entry as
//! `@sprout/service-worker`:
//!
//! ```js
//! export const timestamp = "<version>";
//! export const files = ["favicon.png", ...];     // static files
//! export { files as assets };
//! export const shell = ["client/main.abc.js", ...];
//! export const routes = [{ pattern: /^\/$/ }, ...];
//! ```
//!
//! `version` hashes the lists, so it only changes when what is cached changes.

use crate::manifest::ManifestData;

/// File name of the generated module inside the output directory.
pub const SERVICE_WORKER_MODULE: &str = "service-worker.js";

#[derive(Debug, Clone, Copy)]
pub struct ServiceWorkerInputs<'a> {
    /// Client chunks relative to `dest`, source maps already removed.
    pub client_files: &'a [String],
    /// Files under the static directory, relative to it.
    pub static_files: &'a [String],
    pub ssr: bool,
}

/// Generate the precache manifest module.
pub fn create_serviceworker_manifest(manifest: &ManifestData, inputs: &ServiceWorkerInputs<'_>) -> String {
    let files: Vec<&str> = inputs
        .static_files
        .iter()
        .map(String::as_str)
        .filter(|file| !file.split('/').any(|part| part.starts_with('.')))
        .collect();

    let mut shell: Vec<&str> = inputs
        .client_files
        .iter()
        .map(String::as_str)
        .filter(|file| !file.ends_with(".map"))
        .collect();
    if !inputs.ssr {
        shell.push("index.html");
    }

    let version = version(&files, &shell);
    let routes: Vec<String> = manifest
        .pages()
        .map(|page| format!("\t{{ pattern: /{}/ }}", page.pattern))
        .collect();

    format!(
        "// This file is generated by sprout. Do not edit it.\n\
         export const timestamp = {version};\n\
         \n\
         export const files = {files};\n\
         export {{ files as assets }};\n\
         \n\
         export const shell = {shell};\n\
         \n\
         export const routes = [\n{routes}\n];\n",
        version = json_string(&version),
        files = json_list(&files),
        shell = json_list(&shell),
        routes = routes.join(",\n"),
    )
}

fn version(files: &[&str], shell: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for file in files {
        hasher.update(file.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(b"\0");
    for file in shell {
        hasher.update(file.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().as_str()[..16].to_string()
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn json_list(values: &[&str]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}
