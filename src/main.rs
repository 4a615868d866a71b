use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use catalogd::cli::commands;
use catalogd::cli::{Cli, Commands};
use catalogd::config::{CONFIG_FILE, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config: config_path,
        command,
    } = Cli::parse();

    // Init must work without (or with a broken) configuration file.
    let command = match command {
        Commands::Init { force } => {
            let path = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
            return commands::init::run_init(&path, force);
        }
        command => command,
    };

    let mut config = match &config_path {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    catalogd::logging::init_with_config(&config.logging);

    match command {
        Commands::Config => commands::init::run_config(&config),
        Commands::Watch { catalog_dir } => {
            if let Some(dir) = catalog_dir {
                config.catalog_dir = dir;
            }
            commands::watch::run(&config).await
        }
        Commands::Scan { catalog_dir, json } => {
            if let Some(dir) = catalog_dir {
                config.catalog_dir = dir;
            }
            commands::scan::run(&config, json)
        }
        Commands::Init { .. } => Ok(()),
    }
}
