//! Configuration management for devrack.
//!
//! This module defines the structure of the `devrack.toml` configuration
//! file and provides functionality to load and parse it. CLI flags override
//! file values; the merge lives with the CLI definition.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::task::ProjectType;

/// Top-level configuration structure corresponding to `devrack.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Directory holding one subdirectory per project.
    pub projects_root: Option<PathBuf>,
    /// Program used to run project scripts (default: npm).
    pub runner: Option<String>,
    /// First port probed for server tasks.
    pub base_port: Option<u16>,
    /// Consecutive ports probed before a scan gives up.
    pub max_port_attempts: Option<u32>,
    /// Maximum number of log entries to keep in memory per task.
    pub max_log_entries: Option<usize>,
    /// Projects known to the supervisor.
    #[serde(rename = "project", default)]
    pub projects: Vec<ProjectConfig>,
}

/// Configuration for a single project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Unique project identifier.
    pub id: String,
    /// Project kind, e.g. "create-react-app".
    #[serde(rename = "type")]
    pub kind: ProjectType,
    /// Project directory; defaults to `<projects_root>/<id>`.
    pub path: Option<PathBuf>,
}

/// Loads and parses the configuration from a file path.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}
