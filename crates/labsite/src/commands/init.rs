//! Initialize a site for labsite.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use labsite_static::templates::BUILTIN_TEMPLATES;

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing labsite...");

    scaffold(Path::new("."), config_path, yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'labsite build' to generate member pages.");

    Ok(())
}

/// Write the default config, templates and profiles directory under `root`.
fn scaffold(root: &Path, config_path: &Path, yes: bool) -> Result<()> {
    write_default(&root.join(config_path), DEFAULT_CONFIG, yes)?;

    let templates_dir = root.join("templates");
    fs::create_dir_all(&templates_dir).context("Failed to create templates directory")?;
    for (name, source) in BUILTIN_TEMPLATES {
        write_default(&templates_dir.join(name), source, yes)?;
    }

    let profiles_dir = root.join("profiles");
    if !profiles_dir.exists() {
        fs::create_dir_all(&profiles_dir).context("Failed to create profiles directory")?;
        tracing::info!("Created {}", profiles_dir.display());
    }

    Ok(())
}

fn write_default(path: &Path, contents: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# labsite configuration

[site]
# Group homepage holding the member cards (patched in place)
homepage = "group.html"

# Members and publications spreadsheet (.xlsx, .xls, .ods or .csv)
spreadsheet = "MembersAILab.xlsx"

# Write the patched homepage elsewhere instead
# output = "dist/group.html"

[members]
# Directory receiving the generated member pages
dir = "members"

# URL of that directory as seen from the homepage
url = "members"

# Prefix for relative resources on member pages
resource_prefix = "../"

# Optional <slug>.md profiles with research and education details
profiles = "profiles"

[avatars]
# Photos named <slug>.jpg (or .jpeg, .png, .webp, .gif, .svg)
dir = "images/avatars"
url = "images/avatars"

[templates]
# Overrides for member.html and publications.html
dir = "templates"

[cards]
selector = ".member-card"
avatar_class = "member-avatar"

[columns]
name = "姓名"
year = "Year.1"
title = "Publication Title"
authors = "Authors"
venue = "Conferences/Journals"
notes = "Notes"
homepage = "Homepage"
manual = "Manual"
"#;
