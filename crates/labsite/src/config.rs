//! Configuration file (site.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use labsite_html::CardSelectors;
use labsite_roster::Columns;
use labsite_static::BuildConfig;
use serde::Deserialize;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub members: MembersConfig,
    #[serde(default)]
    pub avatars: AvatarsConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub cards: CardsConfig,
    #[serde(default)]
    pub columns: Columns,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_homepage")]
    pub homepage: String,
    #[serde(default = "default_spreadsheet")]
    pub spreadsheet: String,
    /// Patched homepage destination; the homepage itself when unset
    pub output: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MembersConfig {
    #[serde(default = "default_members_dir")]
    pub dir: String,
    #[serde(default = "default_members_url")]
    pub url: String,
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
    #[serde(default = "default_profiles_dir")]
    pub profiles: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarsConfig {
    #[serde(default = "default_avatars")]
    pub dir: String,
    #[serde(default = "default_avatars")]
    pub url: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct TemplatesConfig {
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardsConfig {
    #[serde(default = "default_card_selector")]
    pub selector: String,
    #[serde(default = "default_avatar_class")]
    pub avatar_class: String,
}

fn default_homepage() -> String {
    "group.html".to_string()
}
fn default_spreadsheet() -> String {
    "MembersAILab.xlsx".to_string()
}
fn default_members_dir() -> String {
    "members".to_string()
}
fn default_members_url() -> String {
    "members".to_string()
}
fn default_resource_prefix() -> String {
    "../".to_string()
}
fn default_profiles_dir() -> String {
    "profiles".to_string()
}
fn default_avatars() -> String {
    "images/avatars".to_string()
}
fn default_card_selector() -> String {
    CardSelectors::default().card
}
fn default_avatar_class() -> String {
    CardSelectors::default().avatar_class
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            homepage: default_homepage(),
            spreadsheet: default_spreadsheet(),
            output: None,
        }
    }
}

impl Default for MembersConfig {
    fn default() -> Self {
        Self {
            dir: default_members_dir(),
            url: default_members_url(),
            resource_prefix: default_resource_prefix(),
            profiles: default_profiles_dir(),
        }
    }
}

impl Default for AvatarsConfig {
    fn default() -> Self {
        Self {
            dir: default_avatars(),
            url: default_avatars(),
        }
    }
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            selector: default_card_selector(),
            avatar_class: default_avatar_class(),
        }
    }
}

impl ConfigFile {
    /// Builder configuration described by this file.
    pub fn into_build_config(self) -> BuildConfig {
        BuildConfig {
            homepage: PathBuf::from(self.site.homepage),
            spreadsheet: PathBuf::from(self.site.spreadsheet),
            output_homepage: self.site.output.map(PathBuf::from),
            members_dir: PathBuf::from(self.members.dir),
            members_url: self.members.url,
            resource_prefix: self.members.resource_prefix,
            avatars_dir: PathBuf::from(self.avatars.dir),
            avatars_url: self.avatars.url,
            profiles_dir: PathBuf::from(self.members.profiles),
            templates_dir: self.templates.dir.map(PathBuf::from),
            selectors: CardSelectors {
                card: self.cards.selector,
                avatar_class: self.cards.avatar_class,
            },
            columns: self.columns,
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}
