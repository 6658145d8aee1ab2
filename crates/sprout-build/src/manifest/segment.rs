//! Path segment parsing, URL pattern generation and route ordering.

use std::cmp::Ordering;

use crate::error::ManifestError;

/// A static or dynamic piece of one path segment.
///
/// `blog-[slug].json` parses to `blog-`, `[slug]` and `.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Part {
    pub content: String,
    pub dynamic: bool,
    pub spread: bool,
    pub qualifier: Option<String>,
}

impl Part {
    pub fn fixed(content: &str) -> Self {
        Self {
            content: content.to_string(),
            dynamic: false,
            spread: false,
            qualifier: None,
        }
    }

    fn param(inner: &str, file: &str) -> Result<Self, ManifestError> {
        let (spread, inner) = match inner.strip_prefix("...") {
            Some(rest) => (true, rest),
            None => (false, inner),
        };

        let (name, qualifier) = match inner.find('(') {
            Some(open) => {
                let qualifier = inner[open + 1..]
                    .strip_suffix(')')
                    .filter(|q| !q.is_empty())
                    .ok_or_else(|| invalid(file, format!("malformed qualifier in [{}]", inner)))?;
                (&inner[..open], Some(qualifier.to_string()))
            }
            None => (inner, None),
        };

        let valid_name = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if !valid_name {
            return Err(invalid(file, format!("invalid parameter name '{}'", name)));
        }

        Ok(Self {
            content: name.to_string(),
            dynamic: true,
            spread,
            qualifier,
        })
    }
}

fn invalid(file: &str, reason: impl Into<String>) -> ManifestError {
    ManifestError::InvalidSegment {
        file: file.to_string(),
        reason: reason.into(),
    }
}

/// Byte offset of the `]` closing the bracket at the start of `s`, skipping
/// any inside a qualifier's parentheses.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ']' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

pub(crate) fn parse_segment(segment: &str, file: &str) -> Result<Vec<Part>, ManifestError> {
    let mut parts: Vec<Part> = Vec::new();
    let mut rest = segment;

    while !rest.is_empty() {
        match rest.find('[') {
            Some(0) => {
                let end = closing_bracket(rest).ok_or_else(|| invalid(file, "unclosed '['"))?;
                if parts.last().is_some_and(|p| p.dynamic) {
                    return Err(invalid(
                        file,
                        "parameters must be separated by static text",
                    ));
                }
                parts.push(Part::param(&rest[1..end], file)?);
                rest = &rest[end + 1..];
            }
            Some(start) => {
                parts.push(Part::fixed(&rest[..start]));
                rest = &rest[start..];
            }
            None => {
                parts.push(Part::fixed(rest));
                rest = "";
            }
        }
    }

    if parts.iter().any(|p| !p.dynamic && p.content.contains(']')) {
        return Err(invalid(file, "unmatched ']'"));
    }

    Ok(parts)
}

/// Append static text to the end of a segment, merging with a trailing
/// static part.
pub(crate) fn append_static(segment: &mut Vec<Part>, text: &str) {
    match segment.last_mut() {
        Some(last) if !last.dynamic => last.content.push_str(text),
        _ => segment.push(Part::fixed(text)),
    }
}

/// Regex source for a sequence of parsed segments.
///
/// Pages tolerate a trailing slash; endpoints match exactly.
pub(crate) fn route_pattern(segments: &[Vec<Part>], trailing_slash: bool) -> String {
    let mut path = String::new();
    for segment in segments {
        path.push_str("\\/");
        for part in segment {
            if part.dynamic {
                match (&part.qualifier, part.spread) {
                    (Some(qualifier), _) => {
                        path.push('(');
                        path.push_str(qualifier);
                        path.push(')');
                    }
                    (None, true) => path.push_str("(.+)"),
                    (None, false) => path.push_str("([^\\/]+?)"),
                }
            } else {
                path.push_str(&regex::escape(&part.content));
            }
        }
    }

    if path.is_empty() {
        return "^\\/$".to_string();
    }

    let end = if trailing_slash { "\\/?$" } else { "$" };
    format!("^{}{}", path, end)
}

/// Match priority between two entries of the same directory.
///
/// Index files first, then static over dynamic over rest parameters,
/// qualified over unqualified, longer static text first.
pub(crate) fn compare_parts(
    a_index: bool,
    a: &[Part],
    b_index: bool,
    b: &[Part],
) -> Ordering {
    if a_index != b_index {
        return if a_index {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    for i in 0..a.len().max(b.len()) {
        let (ap, bp) = match (a.get(i), b.get(i)) {
            (Some(ap), Some(bp)) => (ap, bp),
            (None, _) => return Ordering::Greater,
            (_, None) => return Ordering::Less,
        };

        if ap.spread != bp.spread {
            return if ap.spread {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if ap.dynamic != bp.dynamic {
            return if ap.dynamic {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if ap.qualifier.is_some() != bp.qualifier.is_some() {
            return if ap.qualifier.is_some() {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        if !ap.dynamic && ap.content != bp.content {
            return bp
                .content
                .len()
                .cmp(&ap.content.len())
                .then_with(|| ap.content.cmp(&bp.content));
        }
    }

    Ordering::Equal
}

/// Identifier-safe component name derived from a routes-relative file.
///
/// `blog/[slug].svelte` becomes `blog_$slug`, `blog/index.svelte` becomes
/// `blog`, `[...path].svelte` becomes `$$path`.
pub(crate) fn component_name(file: &str) -> String {
    let stem = match file.rfind('.') {
        Some(dot) if dot > file.rfind('/').map_or(0, |slash| slash + 1) => &file[..dot],
        _ => file,
    };
    let stem = stem.strip_suffix("/index").unwrap_or(stem);

    let mut name = String::with_capacity(stem.len());
    let mut qualifier_depth = 0usize;
    let mut in_param = false;
    let mut rest = stem;

    while let Some(c) = rest.chars().next() {
        if in_param && c == '(' {
            qualifier_depth += 1;
        } else if qualifier_depth > 0 {
            match c {
                '(' => qualifier_depth += 1,
                ')' => qualifier_depth -= 1,
                _ => {}
            }
        } else if c == '[' {
            in_param = true;
            if let Some(after) = rest[1..].strip_prefix("...") {
                name.push_str("$$");
                rest = after;
                continue;
            }
            name.push('$');
        } else if c == ']' {
            in_param = false;
        } else if c == '/' || c == '\\' {
            name.push('_');
        } else if c.is_alphanumeric() || c == '_' || c == '$' {
            name.push(c);
        } else {
            name.push('_');
        }
        rest = &rest[c.len_utf8()..];
    }

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(segment: &str) -> Vec<Part> {
        parse_segment(segment, segment).unwrap()
    }

    #[test]
    fn test_parse_mixed_segment() {
        let parsed = parts("blog-[slug].json");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].content, "blog-");
        assert!(parsed[1].dynamic);
        assert_eq!(parsed[1].content, "slug");
        assert_eq!(parsed[2].content, ".json");
    }

    #[test]
    fn test_parse_qualified_param_with_brackets() {
        let parsed = parts("[id([0-9]+)]");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].content, "id");
        assert_eq!(parsed[0].qualifier.as_deref(), Some("[0-9]+"));
    }

    #[test]
    fn test_parse_spread() {
        let parsed = parts("[...path]");
        assert!(parsed[0].spread);
        assert_eq!(parsed[0].content, "path");
    }

    #[test]
    fn test_adjacent_params_rejected() {
        let err = parse_segment("[a][b]", "x/[a][b].svelte").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidSegment { file, .. } if file == "x/[a][b].svelte"));
    }

    #[test]
    fn test_unclosed_bracket_rejected() {
        assert!(parse_segment("[slug", "[slug.svelte").is_err());
        assert!(parse_segment("slug]", "slug].svelte").is_err());
        assert!(parse_segment("[1abc]", "[1abc].svelte").is_err());
    }

    #[test]
    fn test_route_patterns() {
        let segments = vec![parts("blog"), parts("[slug]")];
        assert_eq!(
            route_pattern(&segments, true),
            "^\\/blog\\/([^\\/]+?)\\/?$"
        );
        assert_eq!(route_pattern(&segments, false), "^\\/blog\\/([^\\/]+?)$");
        assert_eq!(route_pattern(&[], true), "^\\/$");
        assert_eq!(route_pattern(&[parts("[...rest]")], true), "^\\/(.+)\\/?$");
        assert_eq!(
            route_pattern(&[parts("[id([0-9]+)]")], true),
            "^\\/([0-9]+)\\/?$"
        );
    }

    #[test]
    fn test_pattern_escapes_static_text() {
        let pattern = route_pattern(&[parts("blog.json")], false);
        let re = regex::Regex::new(&pattern).unwrap();
        assert!(re.is_match("/blog.json"));
        assert!(!re.is_match("/blogxjson"));
    }

    #[test]
    fn test_ordering() {
        let cmp = |a: &str, b: &str| compare_parts(false, &parts(a), false, &parts(b));
        assert_eq!(cmp("about", "[slug]"), Ordering::Less);
        assert_eq!(cmp("[slug]", "[...rest]"), Ordering::Less);
        assert_eq!(cmp("[id([0-9]+)]", "[slug]"), Ordering::Less);
        assert_eq!(cmp("abc", "ab"), Ordering::Less);
        assert_eq!(
            compare_parts(true, &parts("index"), false, &parts("about")),
            Ordering::Less
        );
    }

    #[test]
    fn test_component_names() {
        assert_eq!(component_name("index.svelte"), "index");
        assert_eq!(component_name("blog/index.svelte"), "blog");
        assert_eq!(component_name("blog/[slug].svelte"), "blog_$slug");
        assert_eq!(component_name("[...path].svelte"), "$$path");
        assert_eq!(component_name("blog/_layout.svelte"), "blog__layout");
        assert_eq!(component_name("[id([0-9]+)].svelte"), "$id");
        assert_eq!(component_name("my-page.html"), "my_page");
        assert_eq!(component_name("404.svelte"), "_404");
    }
}
