//! Standalone `index.html` for builds without server-side rendering.

use crate::compile::BuildInfo;
use crate::error::Error;
use crate::service_worker::json_string;
use crate::template::{
    PLACEHOLDER_BASE, PLACEHOLDER_HEAD, PLACEHOLDER_HTML, PLACEHOLDER_SCRIPTS, PLACEHOLDER_STYLES,
};

/// Logical asset the boot script loads.
const ENTRY_ASSET: &str = "main";

#[derive(Debug, Clone, Copy)]
pub struct IndexInputs<'a> {
    /// Normalized, without surrounding slashes.
    pub basepath: &'a str,
    pub build_info: &'a BuildInfo,
    /// Minified template contents.
    pub template: &'a str,
    pub ssr: bool,
    pub hashbang: bool,
    pub service_worker: bool,
}

/// Render the template into a document that boots the client bundle.
pub fn create_index_html(inputs: &IndexInputs<'_>) -> Result<String, Error> {
    let main = inputs
        .build_info
        .assets
        .get(ENTRY_ASSET)
        .ok_or_else(|| Error::MissingEntryChunk(ENTRY_ASSET.to_string()))?;

    let base = if inputs.basepath.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", inputs.basepath)
    };

    let mut boot = format!(
        "__SPROUT__={{baseUrl:{},hashbang:{},ssr:{},preloaded:[]}};",
        json_string(base.trim_end_matches('/')),
        inputs.hashbang,
        inputs.ssr
    );
    if inputs.service_worker {
        boot.push_str(&format!(
            "if('serviceWorker' in navigator)navigator.serviceWorker.register({});",
            json_string(&format!("{}service-worker.js", base))
        ));
    }

    let mut scripts = format!(
        "<script>{}</script><script type=\"module\" src=\"client/{}\"></script>",
        boot, main
    );
    if let Some(legacy) = inputs
        .build_info
        .legacy_assets
        .as_ref()
        .and_then(|assets| assets.get(ENTRY_ASSET))
    {
        scripts.push_str(&format!("<script nomodule src=\"client/{}\"></script>", legacy));
    }

    let styles = inputs
        .build_info
        .assets
        .get(&format!("{}.css", ENTRY_ASSET))
        .map(|css| format!("<link rel=\"stylesheet\" href=\"client/{}\">", css))
        .unwrap_or_default();

    Ok(inputs
        .template
        .replace(PLACEHOLDER_BASE, &format!("<base href=\"{}\">", base))
        .replace(PLACEHOLDER_STYLES, &styles)
        .replace(PLACEHOLDER_HEAD, "")
        .replace(PLACEHOLDER_HTML, "")
        .replace(PLACEHOLDER_SCRIPTS, &scripts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Bundler;
    use std::collections::BTreeMap;

    const TEMPLATE: &str =
        "<head>%sprout.base%%sprout.styles%%sprout.head%</head><body>%sprout.html%%sprout.scripts%</body>";

    fn info() -> BuildInfo {
        BuildInfo {
            bundler: Bundler::Rollup,
            assets: BTreeMap::from([
                ("main".to_string(), "main.abc.js".to_string()),
                ("main.css".to_string(), "main.abc.css".to_string()),
            ]),
            chunks: vec!["main.abc.js".to_string()],
            components: BTreeMap::new(),
            legacy_assets: None,
        }
    }

    #[test]
    fn test_renders_entry_and_styles() {
        let info = info();
        let html = create_index_html(&IndexInputs {
            basepath: "",
            build_info: &info,
            template: TEMPLATE,
            ssr: false,
            hashbang: true,
            service_worker: false,
        })
        .unwrap();

        assert!(html.contains("<base href=\"/\">"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"client/main.abc.css\">"));
        assert!(html.contains("<script type=\"module\" src=\"client/main.abc.js\"></script>"));
        assert!(html.contains("hashbang:true,ssr:false"));
        assert!(!html.contains("serviceWorker"));
        assert!(!html.contains("%sprout."));
    }

    #[test]
    fn test_basepath_service_worker_and_legacy() {
        let mut info = info();
        info.legacy_assets = Some(BTreeMap::from([(
            "main".to_string(),
            "legacy/main.old.js".to_string(),
        )]));

        let html = create_index_html(&IndexInputs {
            basepath: "app",
            build_info: &info,
            template: TEMPLATE,
            ssr: false,
            hashbang: false,
            service_worker: true,
        })
        .unwrap();

        assert!(html.contains("<base href=\"/app/\">"));
        assert!(html.contains("baseUrl:\"/app\""));
        assert!(html.contains("navigator.serviceWorker.register(\"/app/service-worker.js\")"));
        assert!(html.contains("<script nomodule src=\"client/legacy/main.old.js\"></script>"));
    }

    #[test]
    fn test_missing_entry_chunk() {
        let mut info = info();
        info.assets.clear();

        let err = create_index_html(&IndexInputs {
            basepath: "",
            build_info: &info,
            template: TEMPLATE,
            ssr: false,
            hashbang: false,
            service_worker: false,
        })
        .unwrap_err();
        assert!(matches!(err, Error::MissingEntryChunk(name) if name == "main"));
    }
}
