//! Optional TOML configuration for the CLI.
//!
//! All fields are optional; command-line flags win over the file, the file
//! wins over built-in defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_USER: &str = "default";
pub const DEFAULT_STORE_DIR: &str = "data";
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_INTERVAL: &str = "1h";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    pub user: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub default_symbol: Option<String>,
    pub interval: Option<String>,
}

impl CliConfig {
    /// Parse a config file. A missing file is an error here; the caller
    /// decides whether the path was explicit or just the default location.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from an explicit path (must exist) or the default location
    /// `papertrade.toml` (silently absent is fine).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new("papertrade.toml");
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
