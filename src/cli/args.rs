//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Catalog directory reconciler
#[derive(Parser)]
#[command(
    name = "catalogd",
    version = env!("CARGO_PKG_VERSION"),
    about = "Reconcile catalog directories into correlated resources",
    long_about = "Watch a directory of catalogs and keep one data source, importer, \
                  mapping resource and context alive per catalog.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to a custom catalogd.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    #[command(about = "Create catalogd.toml with default settings")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Watch the catalog directory until interrupted
    #[command(
        about = "Provision catalogs and follow filesystem changes",
        after_help = "Examples:\n  catalogd watch\n  catalogd watch --catalog-dir /srv/catalogs\n  RUST_LOG=debug catalogd watch"
    )]
    Watch {
        /// Base directory (overrides config)
        #[arg(short = 'd', long, env = "CATALOGD_CATALOG_DIR")]
        catalog_dir: Option<PathBuf>,
    },

    /// Provision once, report, tear down
    #[command(
        about = "Run one initial scan and print the provisioned catalogs",
        after_help = "Examples:\n  catalogd scan\n  catalogd scan --json | jq '.[].token'"
    )]
    Scan {
        /// Base directory (overrides config)
        #[arg(short = 'd', long, env = "CATALOGD_CATALOG_DIR")]
        catalog_dir: Option<PathBuf>,

        /// Print snapshots as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,
}
