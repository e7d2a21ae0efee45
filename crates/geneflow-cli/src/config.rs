//! Configuration management for the Geneflow CLI.

use anyhow::{Context, Result};
use geneflow::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the file looked up when no `--config` is given.
pub const CONFIG_FILE: &str = "geneflow.toml";

/// A scenario file: simulation parameters plus the cell layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sim: SimConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl Config {
    /// Load from `path`, or from geneflow.toml in the current or parent
    /// directories, or fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(find_config_file) {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Generate default config as TOML string.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
    }
}

/// Find geneflow.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = Config::default();
        config.save(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[sim]\nseed = 9\n\n[scenario]\nrecycle_mode = true\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sim.seed, 9);
        assert_eq!(config.sim.capture_radius, SimConfig::default().capture_radius);
        assert!(config.scenario.recycle_mode);
        assert_eq!(config.scenario.genes, ScenarioConfig::default().genes);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
