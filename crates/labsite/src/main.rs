//! labsite CLI - member pages and homepage cards for a research group site.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "labsite")]
#[command(about = "Generate member pages and patch the group homepage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to site.toml config file
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default site.toml, templates and profiles directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate member pages and patch the homepage
    Build {
        /// Master homepage (defaults to config or "group.html")
        #[arg(long)]
        homepage: Option<PathBuf>,

        /// Members spreadsheet (defaults to config or "MembersAILab.xlsx")
        #[arg(short, long)]
        spreadsheet: Option<PathBuf>,

        /// Write the patched homepage here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Member pages directory (defaults to config or "members")
        #[arg(short, long)]
        members_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes)?;
        }
        Commands::Build {
            homepage,
            spreadsheet,
            output,
            members_dir,
        } => {
            let overrides = commands::build::Overrides {
                homepage,
                spreadsheet,
                output,
                members_dir,
            };
            commands::build::run(&cli.config, overrides)?;
        }
    }

    Ok(())
}
