//! HTML template loading and minification.
//!
//! The template is the page shell every rendered page (and the static
//! `index.html`) is produced from. It carries `%sprout.*%` placeholders the
//! server runtime or [`create_index_html`](crate::create_index_html) fills in.

use std::path::Path;

use crate::error::TemplateError;
use crate::runtime::{Runtime, RuntimeError, read_to_string};

/// `<base href>` tag.
pub const PLACEHOLDER_BASE: &str = "%sprout.base%";
/// Stylesheet links for the entry chunk.
pub const PLACEHOLDER_STYLES: &str = "%sprout.styles%";
/// Page-specific head content.
pub const PLACEHOLDER_HEAD: &str = "%sprout.head%";
/// Rendered page markup.
pub const PLACEHOLDER_HTML: &str = "%sprout.html%";
/// Boot script. Required.
pub const PLACEHOLDER_SCRIPTS: &str = "%sprout.scripts%";

/// Elements whose content is copied verbatim.
const RAW_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

/// Read `src/<file>` and check it can boot the app.
pub async fn read_template(
    runtime: &dyn Runtime,
    src: &Path,
    file: &str,
) -> Result<String, TemplateError> {
    let path = src.join(file);
    let template = match read_to_string(runtime, &path).await {
        Ok(template) => template,
        Err(RuntimeError::FileNotFound(_)) => return Err(TemplateError::NotFound(path)),
        Err(e) => return Err(e.into()),
    };

    if !template.contains(PLACEHOLDER_SCRIPTS) {
        return Err(TemplateError::MissingPlaceholder {
            file: path,
            placeholder: PLACEHOLDER_SCRIPTS,
        });
    }

    Ok(template)
}

/// Strip comments and collapse whitespace runs to a single space.
///
/// Conditional comments (`<!--[if ...]>`) and the content of `pre`,
/// `textarea`, `script` and `style` elements are preserved.
pub fn minify_html(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(c) = rest.chars().next() {
        if let Some(comment) = rest.strip_prefix("<!--") {
            let end = comment.find("-->").map_or(rest.len(), |i| i + "<!---->".len());
            if comment.starts_with("[if") {
                out.push_str(&rest[..end]);
            }
            rest = &rest[end..];
            continue;
        }

        if let Some(end) = raw_element_end(rest) {
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        if c.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
            rest = rest.trim_start();
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out.trim().to_string()
}

/// If `s` opens a raw-text element, the byte offset just past its closing tag.
fn raw_element_end(s: &str) -> Option<usize> {
    let rest = s.strip_prefix('<')?;
    let name = RAW_ELEMENTS.iter().find(|name| {
        rest.get(..name.len())
            .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
            && rest[name.len()..].starts_with(|c: char| c == '>' || c.is_whitespace())
    })?;

    let close = format!("</{}", name);
    let lower = s.to_ascii_lowercase();
    let end = match lower.find(&close) {
        Some(start) => lower[start..].find('>').map_or(s.len(), |i| start + i + 1),
        None => s.len(),
    };
    Some(end)
}
