//! `config.toml` location and loading.
//!
//! The file is optional. It can hold the API key, a base URL override,
//! the rate limiting switch and the default output format:
//!
//! ```toml
//! [api]
//! key = "..."
//! rate_limiting = true
//!
//! [output]
//! format = "table"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Directory name under the user config root.
const APP_DIR: &str = "transistor";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// `[api]` table.
    #[serde(default)]
    pub api: ApiConfig,
    /// `[output]` table.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[api]` table.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// Used when neither `--api-key` nor `TRANSISTOR_API_KEY` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Unset means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limiting: Option<bool>,
}

/// `[output]` table.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

/// Returns the config file location.
///
/// `dir` (from `--dir`) wins. Otherwise the file lives in
/// `$XDG_CONFIG_HOME/transistor/`, falling back to `~/.config/transistor/`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_path(dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir.join(CONFIG_FILE));
    }

    let root = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(xdg) => PathBuf::from(xdg),
        None => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .context("cannot locate config directory: HOME is not set")?,
    };
    Ok(root.join(APP_DIR).join(CONFIG_FILE))
}

impl AppConfig {
    /// Reads `path`, treating a missing file as an empty config.
    ///
    /// # Errors
    ///
    /// Returns an error naming the file if it exists but is unreadable
    /// or not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}
