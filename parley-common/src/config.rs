//! Configuration loading and data-directory resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Service configuration, read from the `[coordinator]` table of the
/// config file with compiled defaults for anything missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    /// Duration of a token-joined session, minutes
    pub token_session_minutes: i64,
    /// Duration of a booked (pending) session, minutes
    pub booking_session_minutes: i64,
    /// Validity window for newly issued access tokens, minutes
    pub token_validity_minutes: i64,
    /// Interval between expired-token sweeps, seconds
    pub sweep_interval_secs: u64,
    /// Event bus buffer capacity
    pub event_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5850".to_string(),
            token_session_minutes: 60,
            booking_session_minutes: 120,
            token_validity_minutes: 240,
            sweep_interval_secs: 300,
            event_capacity: 100,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file or the `[coordinator]` table is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_file() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let value: toml::Value = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        match value.get("coordinator") {
            Some(section) => section
                .clone()
                .try_into()
                .map_err(|e| Error::Config(format!("Invalid [coordinator] table: {}", e))),
            None => Ok(Self::default()),
        }
    }
}

/// Data-directory resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. PARLEY_DATA environment variable
/// 3. `root_folder` key in the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("PARLEY_DATA") {
        return PathBuf::from(path);
    }

    if let Some(config_path) = default_config_file() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    default_data_dir()
}

/// Platform config file location (~/.config/parley/config.toml or equivalent)
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("parley").join("config.toml"))
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("parley"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/parley"))
}

/// Database path inside the data directory
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("parley.db")
}

/// Create the data directory if missing
pub fn ensure_data_dir(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    Ok(())
}
