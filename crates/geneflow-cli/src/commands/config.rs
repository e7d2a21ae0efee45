//! Print or write the default scenario file.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;

pub fn run(output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if path.exists() {
                println!("  {} {} already exists", "•".yellow(), path.display());
                return Ok(());
            }
            Config::default().save(path)?;
            println!("  {} Created {}", "✓".green(), path.display());
        }
        None => print!("{}", Config::default_toml()?),
    }
    Ok(())
}
