//! Configuration management for the CLI.
//!
//! The file lives at `~/.trove/config.toml` unless `--config` or
//! `TROVE_CONFIG` points elsewhere:
//!
//! ```toml
//! [projects.churn]
//! path = "/home/me/work/churn/data"
//!
//! [settings]
//! color = true
//! format = "table"
//! full_listing = false
//! ignored = ["scratch"]
//! ```

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use trove_store::ScanOptions;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project nicknames
    #[serde(default)]
    pub projects: BTreeMap<String, Project>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// A registered data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Root of the project's data
    pub path: PathBuf,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// List every file by default
    #[serde(default)]
    pub full_listing: bool,

    /// Names to skip while scanning, on top of the built-in set
    #[serde(default)]
    pub ignored: Vec<String>,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and trees
    Table,
    /// JSON format
    Json,
    /// Paths only
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".trove").join("config.toml"))
    }

    /// Load configuration from a file; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Register a project; an existing name is only replaced with `replace`.
    pub fn add_project(&mut self, name: String, path: PathBuf, replace: bool) -> Result<()> {
        if self.projects.contains_key(&name) && !replace {
            return Err(CliError::NotPermitted(format!(
                "project '{}' already exists; pass --force to replace it",
                name
            )));
        }
        self.projects.insert(name, Project { path });
        Ok(())
    }

    /// Remove a project.
    pub fn remove_project(&mut self, name: &str) -> Result<Project> {
        self.projects.remove(name).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "no project named '{}'; known projects: [{}]",
                name,
                self.projects.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Resolve a location argument: a project nickname, else a path.
    pub fn resolve_location(&self, location: &str) -> PathBuf {
        match self.projects.get(location) {
            Some(project) => project.path.clone(),
            None => PathBuf::from(location),
        }
    }

    /// Scan options with the configured extra ignores.
    pub fn scan_options(&self) -> ScanOptions {
        self.settings
            .ignored
            .iter()
            .fold(ScanOptions::default(), |options, name| options.ignore(name.clone()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            full_listing: false,
            ignored: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
