//! CLI configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SEMGRAPH_CONFIG";

/// Location of the config file
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("semgraph")
        .join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default)]
    pub show_tags: bool,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_format() -> String {
    "compact".to_string()
}

fn default_indent() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            show_tags: false,
            indent: default_indent(),
        }
    }
}

impl Config {
    /// Read the config file; defaults when it is missing or unreadable
    pub fn load() -> Self {
        let path = config_file_path();
        if !path.exists() {
            return Self::default();
        }

        let parsed = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .and_then(|content| {
                toml::from_str::<Self>(&content).with_context(|| format!("Failed to parse {}", path.display()))
            });

        match parsed {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = config_file_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &["default_format", "show_tags", "indent"]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "default_format" => Some(self.default_format.clone()),
            "show_tags" => Some(self.show_tags.to_string()),
            "indent" => Some(self.indent.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default_format" => {
                if !matches!(value, "compact" | "list" | "tree" | "json") {
                    anyhow::bail!("Invalid format '{}': expected compact, list, tree or json", value);
                }
                self.default_format = value.to_string();
            }
            "show_tags" => {
                self.show_tags = value
                    .parse()
                    .with_context(|| format!("Invalid boolean for show_tags: {}", value))?;
            }
            "indent" => {
                self.indent = value
                    .parse()
                    .with_context(|| format!("Invalid number for indent: {}", value))?;
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }
}
