//! HTML transformations for the lab site.
//!
//! Reads fragments out of the master homepage, rewrites relative resource
//! paths so the fragments work from a subdirectory, and patches the member
//! cards on the homepage in place.

pub mod cards;
pub mod master;
pub mod paths;

pub use cards::{patch_cards, Avatar, CardLink, CardPatch, CardResolver, CardSelectors, PatchReport};
pub use master::{Fragments, MasterPage};
pub use paths::{is_local, prefix_path, prefix_resources, rewrite_style_urls};

/// Errors that can occur when rewriting HTML.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// Escape HTML special characters for text and attribute values.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Decode the entities produced by [`html_escape`].
pub(crate) fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
