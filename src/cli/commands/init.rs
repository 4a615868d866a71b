//! Init and Config commands.

use std::path::Path;

use anyhow::{Result, bail};

use crate::config::Settings;

/// Write a default configuration file at `path`.
pub fn run_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            path.display()
        );
    }

    Settings::default().save(path)?;
    println!("Created configuration file at: {}", path.display());
    Ok(())
}

/// Print the effective configuration.
pub fn run_config(config: &Settings) -> Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", config.to_toml()?);
    Ok(())
}
