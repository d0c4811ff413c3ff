//! Site builder.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use labsite_html::{
    is_local, patch_cards, prefix_path, Avatar, CardLink, CardPatch, CardResolver, CardSelectors,
    Fragments, MasterPage, PatchReport, RewriteError,
};
use labsite_roster::{
    load_profile, load_sheet, Columns, Member, ProfileError, Roster, RosterError, SheetError,
};

use crate::avatars::AvatarIndex;
use crate::templates::{Context, TemplateEngine};

/// Configuration for building the site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Master homepage holding the member cards
    pub homepage: PathBuf,

    /// Members and publications spreadsheet
    pub spreadsheet: PathBuf,

    /// Where the patched homepage is written (the homepage itself when unset)
    pub output_homepage: Option<PathBuf>,

    /// Directory receiving the member pages
    pub members_dir: PathBuf,

    /// URL of the members directory relative to the homepage
    pub members_url: String,

    /// Prefix added to relative resource paths on member pages
    pub resource_prefix: String,

    /// Directory searched for avatar images
    pub avatars_dir: PathBuf,

    /// URL of the avatar directory relative to the homepage
    pub avatars_url: String,

    /// Directory of optional `<slug>.md` profiles
    pub profiles_dir: PathBuf,

    /// Directory of template overrides
    pub templates_dir: Option<PathBuf>,

    /// Card and avatar selectors
    pub selectors: CardSelectors,

    /// Spreadsheet column names
    pub columns: Columns,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            homepage: PathBuf::from("group.html"),
            spreadsheet: PathBuf::from("MembersAILab.xlsx"),
            output_homepage: None,
            members_dir: PathBuf::from("members"),
            members_url: "members".to_string(),
            resource_prefix: "../".to_string(),
            avatars_dir: PathBuf::from("images/avatars"),
            avatars_url: "images/avatars".to_string(),
            profiles_dir: PathBuf::from("profiles"),
            templates_dir: None,
            selectors: CardSelectors::default(),
            columns: Columns::default(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of member pages generated
    pub pages: usize,

    /// Number of manual members skipped
    pub manual: usize,

    /// Homepage card patching summary
    pub cards: PatchReport,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Patched homepage path
    pub homepage: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read input: {0}")]
    ReadError(String),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Failed to load profile for {slug}: {source}")]
    Profile { slug: String, source: ProfileError },

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Site builder.
pub struct SiteBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        let templates = match &config.templates_dir {
            Some(dir) if dir.is_dir() => TemplateEngine::with_overrides(dir),
            Some(dir) => {
                tracing::warn!(
                    "Templates directory {} not found, using built-in templates",
                    dir.display()
                );
                TemplateEngine::new()
            }
            None => TemplateEngine::new(),
        };

        Self { config, templates }
    }

    /// Build member pages and patch the homepage.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let sheet = load_sheet(&self.config.spreadsheet)?;
        let roster = Roster::from_sheet(&sheet, &self.config.columns)?;
        tracing::info!(
            "Loaded {} members from {}",
            roster.len(),
            self.config.spreadsheet.display()
        );

        let source = fs::read_to_string(&self.config.homepage).map_err(|e| {
            BuildError::ReadError(format!("{}: {}", self.config.homepage.display(), e))
        })?;
        let master = MasterPage::parse(&source);
        let fragments = master.member_fragments(&self.config.resource_prefix)?;

        let card_count = master.count(&self.config.selectors.card)?;
        if card_count == 0 {
            tracing::warn!(
                "No cards matching '{}' found in {}",
                self.config.selectors.card,
                self.config.homepage.display()
            );
        } else {
            tracing::info!(
                "Found {} member cards in {}",
                card_count,
                self.config.homepage.display()
            );
        }

        let avatars = AvatarIndex::scan(&self.config.avatars_dir, &self.config.avatars_url);

        fs::create_dir_all(&self.config.members_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        // Render pages in parallel
        let generated: Vec<&Member> = roster.iter().filter(|m| !m.manual).collect();
        generated
            .par_iter()
            .map(|member| self.build_page(member, &fragments, &avatars))
            .collect::<Result<Vec<_>, BuildError>>()?;

        let manual = roster.len() - generated.len();
        for member in roster.iter().filter(|m| m.manual) {
            tracing::debug!("Skipping page for manual member {}", member.name);
        }

        let resolver = SiteResolver {
            roster: &roster,
            avatars: &avatars,
            generated: generated.iter().map(|m| m.slug.as_str()).collect(),
            members_dir: &self.config.members_dir,
            members_url: self.config.members_url.trim_end_matches('/'),
        };
        let (patched, cards) = patch_cards(master.source(), &self.config.selectors, &resolver)?;

        let homepage = self
            .config
            .output_homepage
            .clone()
            .unwrap_or_else(|| self.config.homepage.clone());
        write_file(&homepage, &patched)?;

        Ok(BuildResult {
            pages: generated.len(),
            manual,
            cards,
            duration_ms: start.elapsed().as_millis() as u64,
            homepage,
        })
    }

    /// Render and write a single member page.
    fn build_page(
        &self,
        member: &Member,
        fragments: &Fragments,
        avatars: &AvatarIndex,
    ) -> Result<(), BuildError> {
        let profile = load_profile(&self.config.profiles_dir, &member.slug).map_err(|e| {
            BuildError::Profile {
                slug: member.slug.clone(),
                source: e,
            }
        })?;

        let context = Context {
            name: member.name.clone(),
            name_en: member.romanized.clone(),
            avatar: avatars
                .lookup(&member.slug)
                .map(|url| prefix_path(&url, &self.config.resource_prefix)),
            publications: member.publications.clone(),
            profile,
        };

        let html = self
            .templates
            .render_member(fragments, &context)
            .map_err(|e| BuildError::TemplateError(format!("{}: {}", member.slug, e)))?;

        let path = self.config.members_dir.join(format!("{}.html", member.slug));
        write_file(&path, &html)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    fs::write(path, contents)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Resolves homepage cards against the roster.
struct SiteResolver<'a> {
    roster: &'a Roster,
    avatars: &'a AvatarIndex,
    generated: HashSet<&'a str>,
    members_dir: &'a Path,
    members_url: &'a str,
}

impl SiteResolver<'_> {
    fn link(&self, member: &Member) -> Option<CardLink> {
        if let Some(homepage) = &member.homepage {
            return Some(CardLink {
                href: homepage.clone(),
                external: !is_local(homepage),
            });
        }

        let file = format!("{}.html", member.slug);
        let has_page = self.generated.contains(member.slug.as_str())
            || self.members_dir.join(&file).is_file();

        has_page.then(|| CardLink {
            href: format!("{}/{}", self.members_url, file),
            external: false,
        })
    }
}

impl CardResolver for SiteResolver<'_> {
    fn resolve(&self, name: &str) -> CardPatch {
        let Some(member) = self.roster.get(name) else {
            tracing::warn!("Card '{}' has no matching spreadsheet row", name);
            return CardPatch {
                display_name: name.to_string(),
                link: None,
                avatar: Avatar::Icon,
            };
        };

        let avatar = match self.avatars.lookup(&member.slug) {
            Some(src) => Avatar::Image {
                src,
                alt: member.romanized.clone(),
            },
            None => Avatar::Icon,
        };

        CardPatch {
            display_name: member.romanized.clone(),
            link: self.link(member),
            avatar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const HOMEPAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>AI Lab</title>
  <link rel="stylesheet" href="css/main.css">
</head>
<body>
<nav class="navbar"><a href="index.html">Home</a></nav>
<header style="background: url('img/banner.jpg')"><h1>Group</h1></header>
<section class="members">
  <div class="member-card"><div class="member-avatar"></div><p>张三</p></div>
  <div class="member-card"><div class="member-avatar"></div><p>李四</p></div>
  <div class="member-card"><div class="member-avatar"></div><p>王五</p></div>
  <div class="member-card"><div class="member-avatar"></div><p>赵六</p></div>
</section>
<footer><img src="img/logo.png"></footer>
</body>
</html>"#;

    const SPREADSHEET: &str = "\
姓名,Year,Publication Title,Authors,Conferences/Journals,Year,Notes,Homepage,Manual
张三,2020,Old Paper,Zhang,ICML,2021.0,,,
张三,2020,New Paper,Zhang & Li,NeurIPS,2023.0,oral,,
李四,2021,,,,,,https://lisi.example.com,
王五,2019,Manual Paper,Wang,AAAI,2020,,,yes
";

    fn setup(root: &Path) -> BuildConfig {
        fs::write(root.join("group.html"), HOMEPAGE).unwrap();
        fs::write(root.join("members.csv"), SPREADSHEET).unwrap();
        fs::create_dir_all(root.join("images/avatars")).unwrap();
        fs::write(root.join("images/avatars/zhangsan.jpg"), b"").unwrap();

        BuildConfig {
            homepage: root.join("group.html"),
            spreadsheet: root.join("members.csv"),
            members_dir: root.join("members"),
            avatars_dir: root.join("images/avatars"),
            profiles_dir: root.join("profiles"),
            ..Default::default()
        }
    }

    #[test]
    fn builds_member_pages() {
        let temp = tempdir().unwrap();
        let config = setup(temp.path());

        let result = SiteBuilder::new(config).build().unwrap();

        assert_eq!(result.pages, 2);
        assert_eq!(result.manual, 1);
        assert!(temp.path().join("members/zhangsan.html").exists());
        assert!(temp.path().join("members/lisi.html").exists());
        assert!(!temp.path().join("members/wangwu.html").exists());

        let page = fs::read_to_string(temp.path().join("members/zhangsan.html")).unwrap();
        assert!(page.contains(r#"<base href="../">"#));
        assert!(page.contains(r#"href="../css/main.css""#));
        assert!(page.contains("url('../img/banner.jpg')"));
        assert!(page.contains(r#"src="../img/logo.png""#));
        assert!(page.contains("San Zhang</h1>"));
        assert!(page.contains(r#"src="../images/avatars/zhangsan.jpg""#));

        let new = page.find("New Paper").unwrap();
        let old = page.find("Old Paper").unwrap();
        assert!(new < old);
        assert!(page.contains("<td>2023</td>"));
        assert!(page.contains("Zhang &amp; Li"));
    }

    #[test]
    fn patches_homepage_cards() {
        let temp = tempdir().unwrap();
        let config = setup(temp.path());

        let result = SiteBuilder::new(config).build().unwrap();

        assert_eq!(result.cards.cards, 4);
        assert_eq!(result.cards.linked, 2);
        assert_eq!(result.cards.images, 1);
        assert_eq!(result.cards.icons, 3);
        assert_eq!(result.homepage, temp.path().join("group.html"));

        let home = fs::read_to_string(temp.path().join("group.html")).unwrap();
        assert!(home.contains(r#"<a href="members/zhangsan.html" target="_self" data-member-link="张三">"#));
        assert!(home.contains(
            r#"<a href="https://lisi.example.com" target="_blank" rel="noopener" data-member-link="李四">"#
        ));
        assert!(home.contains("<p>San Zhang</p>"));
        assert!(home.contains("<p>Si Li</p>"));
        assert!(home.contains("<p>Wu Wang</p>"));
        assert!(home.contains(r#"src="images/avatars/zhangsan.jpg""#));
        assert!(home.contains("<p>赵六</p>"));
        assert!(!home.contains("members/wangwu.html"));
    }

    #[test]
    fn links_hand_maintained_pages() {
        let temp = tempdir().unwrap();
        let config = setup(temp.path());
        fs::create_dir_all(temp.path().join("members")).unwrap();
        fs::write(temp.path().join("members/wangwu.html"), "<p>custom</p>").unwrap();

        let result = SiteBuilder::new(config).build().unwrap();

        assert_eq!(result.cards.linked, 3);
        let home = fs::read_to_string(temp.path().join("group.html")).unwrap();
        assert!(home.contains(r#"href="members/wangwu.html""#));
        let manual = fs::read_to_string(temp.path().join("members/wangwu.html")).unwrap();
        assert_eq!(manual, "<p>custom</p>");
    }

    #[test]
    fn rebuilding_is_stable() {
        let temp = tempdir().unwrap();
        let config = setup(temp.path());
        let builder = SiteBuilder::new(config);

        builder.build().unwrap();
        let first = fs::read_to_string(temp.path().join("group.html")).unwrap();
        builder.build().unwrap();
        let second = fs::read_to_string(temp.path().join("group.html")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn writes_to_separate_output() {
        let temp = tempdir().unwrap();
        let mut config = setup(temp.path());
        config.output_homepage = Some(temp.path().join("out.html"));

        SiteBuilder::new(config).build().unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("group.html")).unwrap(),
            HOMEPAGE
        );
        let out = fs::read_to_string(temp.path().join("out.html")).unwrap();
        assert!(out.contains("<p>San Zhang</p>"));
    }

    #[test]
    fn fills_profiles() {
        let temp = tempdir().unwrap();
        let config = setup(temp.path());
        fs::create_dir_all(temp.path().join("profiles")).unwrap();
        fs::write(
            temp.path().join("profiles/zhangsan.md"),
            "---\nresearch: Graph learning\n---\n",
        )
        .unwrap();

        SiteBuilder::new(config).build().unwrap();

        let page = fs::read_to_string(temp.path().join("members/zhangsan.html")).unwrap();
        assert!(page.contains("Graph learning"));
    }

    #[test]
    fn invalid_profile_fails_build() {
        let temp = tempdir().unwrap();
        let config = setup(temp.path());
        fs::create_dir_all(temp.path().join("profiles")).unwrap();
        fs::write(temp.path().join("profiles/lisi.md"), "---\nresearch: x\n").unwrap();

        let result = SiteBuilder::new(config).build();

        assert!(matches!(result, Err(BuildError::Profile { slug, .. }) if slug == "lisi"));
    }

    #[test]
    fn homepage_without_cards_still_builds() {
        let temp = tempdir().unwrap();
        let config = setup(temp.path());
        fs::write(
            temp.path().join("group.html"),
            "<html><head></head><body><p>No team yet</p></body></html>",
        )
        .unwrap();

        let result = SiteBuilder::new(config).build().unwrap();

        assert_eq!(result.cards.cards, 0);
        assert_eq!(result.pages, 2);
    }

    #[test]
    fn invalid_card_selector_fails() {
        let temp = tempdir().unwrap();
        let mut config = setup(temp.path());
        config.selectors.card = "[[".to_string();

        let result = SiteBuilder::new(config).build();

        assert!(matches!(result, Err(BuildError::Rewrite(_))));
    }

    #[test]
    fn missing_homepage_fails() {
        let temp = tempdir().unwrap();
        let mut config = setup(temp.path());
        config.homepage = temp.path().join("missing.html");

        let result = SiteBuilder::new(config).build();

        assert!(matches!(result, Err(BuildError::ReadError(_))));
    }
}
