//! Relative resource path rewriting.
//!
//! Pages generated into a subdirectory reuse fragments of the homepage, so
//! every site-relative `src`/`href`/`data-src` and every `url(...)` inside a
//! `style` attribute has to be prefixed (typically with `../`).

use std::sync::LazyLock;

use lol_html::{element, rewrite_str, RewriteStrSettings};
use regex::{Captures, Regex};

use crate::RewriteError;

/// Attributes holding resource paths.
const RESOURCE_ATTRS: [&str; 3] = ["src", "href", "data-src"];

/// Prefixes marking a path that is not relative to the site.
const NON_LOCAL_PREFIXES: [&str; 8] = [
    "http://",
    "https://",
    "//",
    "/",
    "data:",
    "#",
    "mailto:",
    "javascript:",
];

/// Whether a path is relative to the site (and therefore needs prefixing).
pub fn is_local(path: &str) -> bool {
    !path.is_empty() && !NON_LOCAL_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Prefix a local path, leaving absolute, external and already-prefixed paths alone.
pub fn prefix_path(path: &str, prefix: &str) -> String {
    let trimmed = path.trim();
    if is_local(trimmed) && !trimmed.starts_with(prefix) {
        format!("{}{}", prefix, trimmed)
    } else {
        path.to_string()
    }
}

/// Prefix the targets of `url(...)` references in an inline style.
///
/// Rewritten references use single quotes so they survive inside a
/// double-quoted attribute; `&quot;` quoting from a previous pass is accepted.
pub fn rewrite_style_urls(style: &str, prefix: &str) -> String {
    static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"url\(\s*(?:&quot;|['"])?(.*?)(?:&quot;|['"])?\s*\)"#)
            .expect("Invalid style url regex")
    });

    URL_RE
        .replace_all(style, |caps: &Captures| {
            let target = &caps[1];
            if is_local(target) && !target.starts_with(prefix) {
                format!("url('{}{}')", prefix, target)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Prefix every local resource path in an HTML fragment.
pub fn prefix_resources(html: &str, prefix: &str) -> Result<String, RewriteError> {
    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                for attr in RESOURCE_ATTRS {
                    if let Some(value) = el.get_attribute(attr) {
                        let rewritten = prefix_path(&value, prefix);
                        if rewritten != value {
                            el.set_attribute(attr, &rewritten)?;
                        }
                    }
                }

                if let Some(style) = el.get_attribute("style") {
                    let rewritten = rewrite_style_urls(&style, prefix);
                    if rewritten != style {
                        el.set_attribute("style", &rewritten)?;
                    }
                }

                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(output)
}
