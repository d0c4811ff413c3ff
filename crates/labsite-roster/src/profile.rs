//! Optional member profiles.
//!
//! A profile is a Markdown file named after the member's slug, with YAML
//! frontmatter carrying the structured fields shown on the member page and
//! an optional biography as the body.

use std::fs;
use std::path::Path;

use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};

/// Structured profile fields from the frontmatter block.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ProfileMeta {
    /// Research interests
    #[serde(default)]
    pub research: Option<String>,

    /// Bachelor school
    #[serde(default)]
    pub bachelor: Option<String>,

    /// Master school
    #[serde(default)]
    pub master: Option<String>,

    /// Doctoral school
    #[serde(default)]
    pub phd: Option<String>,

    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
}

/// A parsed member profile.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Profile {
    /// Frontmatter fields
    pub meta: ProfileMeta,

    /// Biography rendered to HTML (empty when the body is blank)
    pub bio_html: String,
}

/// Errors that can occur when reading a profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Failed to read profile {path}: {message}")]
    Read { path: String, message: String },
}

/// Extract frontmatter from a profile.
///
/// Returns the parsed fields and the remaining content after the frontmatter block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<ProfileMeta>, &str), ProfileError> {
    let trimmed = source.trim_start_matches('\u{feff}').trim_start();

    if !trimmed.starts_with("---") {
        return Ok((None, source));
    }

    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(ProfileError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    let meta = if yaml_content.is_empty() {
        ProfileMeta::default()
    } else {
        serde_yaml::from_str(yaml_content).map_err(|e| ProfileError::InvalidYaml(e.to_string()))?
    };

    Ok((Some(meta), remaining.trim_start()))
}

/// Parse a profile: frontmatter fields plus the Markdown biography as HTML.
pub fn parse_profile(source: &str) -> Result<Profile, ProfileError> {
    let (meta, body) = extract_frontmatter(source)?;

    let bio_html = if body.trim().is_empty() {
        String::new()
    } else {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(body, options);

        let mut output = String::new();
        html::push_html(&mut output, parser);
        output
    };

    Ok(Profile {
        meta: meta.unwrap_or_default(),
        bio_html,
    })
}

/// Load `<dir>/<slug>.md` if it exists.
pub fn load_profile(dir: &Path, slug: &str) -> Result<Option<Profile>, ProfileError> {
    let path = dir.join(format!("{}.md", slug));
    if !path.is_file() {
        return Ok(None);
    }

    let source = fs::read_to_string(&path).map_err(|e| ProfileError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::debug!("Loaded profile {}", path.display());
    parse_profile(&source).map(Some)
}
