//! Site build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use labsite_static::{BuildConfig, SiteBuilder};

use crate::config::load_config;

/// Command-line values taking precedence over site.toml.
#[derive(Debug, Default)]
pub struct Overrides {
    pub homepage: Option<PathBuf>,
    pub spreadsheet: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub members_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut BuildConfig) {
        if let Some(homepage) = self.homepage {
            config.homepage = homepage;
        }
        if let Some(spreadsheet) = self.spreadsheet {
            config.spreadsheet = spreadsheet;
        }
        if let Some(output) = self.output {
            config.output_homepage = Some(output);
        }
        if let Some(members_dir) = self.members_dir {
            config.members_dir = members_dir;
        }
    }
}

/// Run the build command.
pub fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    tracing::info!("Building member pages...");

    let mut config = load_config(config_path)?.into_build_config();
    overrides.apply(&mut config);

    let result = SiteBuilder::new(config)
        .build()
        .context("Build failed")?;

    tracing::info!(
        "Built {} member pages ({} manual) in {}ms",
        result.pages,
        result.manual,
        result.duration_ms
    );
    tracing::info!(
        "Patched {} cards: {} linked, {} photos, {} placeholders",
        result.cards.cards,
        result.cards.linked,
        result.cards.images,
        result.cards.icons
    );
    if result.cards.skipped > 0 {
        tracing::warn!("{} cards had no name paragraph", result.cards.skipped);
    }
    tracing::info!("Homepage: {}", result.homepage.display());

    Ok(())
}
