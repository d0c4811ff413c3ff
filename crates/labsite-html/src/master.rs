//! The master homepage and the fragments shared with member pages.

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use scraper::{Html, Selector};

use crate::paths::prefix_resources;
use crate::{html_escape, RewriteError};

/// Page fragments reused by every member page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    /// The whole `<head>` element
    pub head: String,

    /// The first `<nav>` element
    pub nav: String,

    /// The first `<header>` element (page banner)
    pub banner: String,

    /// The first `<footer>` element
    pub footer: String,
}

/// The parsed master homepage.
pub struct MasterPage {
    source: String,
    document: Html,
}

impl MasterPage {
    /// Parse the homepage source.
    pub fn parse(source: &str) -> Self {
        Self {
            source: source.to_string(),
            document: Html::parse_document(source),
        }
    }

    /// The original source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Outer HTML of the first element matching `css`, or an empty string.
    pub fn outer_html(&self, css: &str) -> Result<String, RewriteError> {
        let selector = parse_selector(css)?;

        Ok(self
            .document
            .select(&selector)
            .next()
            .map(|el| el.html())
            .unwrap_or_default())
    }

    /// Whether the head already declares a `<base>`.
    pub fn has_base(&self) -> bool {
        let selector = parse_selector("head base").expect("static selector");
        self.document.select(&selector).next().is_some()
    }

    /// Number of elements matching `css`.
    pub fn count(&self, css: &str) -> Result<usize, RewriteError> {
        let selector = parse_selector(css)?;
        Ok(self.document.select(&selector).count())
    }

    /// Fragments exactly as they appear on the homepage.
    pub fn fragments(&self) -> Result<Fragments, RewriteError> {
        let fragments = Fragments {
            head: self.outer_html("head")?,
            nav: self.outer_html("nav")?,
            banner: self.outer_html("header")?,
            footer: self.outer_html("footer")?,
        };

        for (name, html) in [
            ("nav", &fragments.nav),
            ("header", &fragments.banner),
            ("footer", &fragments.footer),
        ] {
            if html.is_empty() {
                tracing::warn!("Homepage has no <{}> element; member pages will omit it", name);
            }
        }

        Ok(fragments)
    }

    /// Fragments prepared for pages one directory below the homepage.
    ///
    /// The head gains a `<base href="<prefix>">` when it has none, and every
    /// local resource path is prefixed.
    pub fn member_fragments(&self, prefix: &str) -> Result<Fragments, RewriteError> {
        let fragments = self.fragments()?;

        let head = if self.has_base() {
            fragments.head
        } else {
            insert_base(&fragments.head, prefix)?
        };

        Ok(Fragments {
            head: prefix_resources(&head, prefix)?,
            nav: prefix_resources(&fragments.nav, prefix)?,
            banner: prefix_resources(&fragments.banner, prefix)?,
            footer: prefix_resources(&fragments.footer, prefix)?,
        })
    }
}

/// Insert `<base href>` as the first child of `<head>`.
fn insert_base(head: &str, href: &str) -> Result<String, RewriteError> {
    let base = format!(r#"<base href="{}">"#, html_escape(href));

    let output = rewrite_str(
        head,
        RewriteStrSettings {
            element_content_handlers: vec![element!("head", |el| {
                el.prepend(&base, ContentType::Html);
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(output)
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, RewriteError> {
    Selector::parse(css).map_err(|e| RewriteError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}
