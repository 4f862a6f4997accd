//! Per-user configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MargoConfig {
    /// Base URL of the assistant service.
    pub assistant_url: String,
    /// Target language for the translate mode.
    pub translate_language: String,
    /// Override for the archive location; defaults to the platform data
    /// directory.
    pub archive_path: Option<PathBuf>,
}

impl Default for MargoConfig {
    fn default() -> Self {
        Self {
            assistant_url: "http://localhost:3000".to_string(),
            translate_language: "Chinese".to_string(),
            archive_path: None,
        }
    }
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("margo"))
}

fn config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load the config, writing defaults on first run so there is a file to
/// edit. A partial file deserializes with defaults for missing fields.
pub fn load_or_init() -> eyre::Result<MargoConfig> {
    let path = config_path()?;
    if !path.exists() {
        let config = MargoConfig::default();
        save_config(&config)?;
        tracing::info!(path = %path.display(), "wrote default config");
        return Ok(config);
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn save_config(config: &MargoConfig) -> eyre::Result<()> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;

    let path = dir.join("config.json");
    let json = serde_json::to_string_pretty(config)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = dir.join("config.json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;
    std::fs::rename(&tmp_path, &path)?;

    Ok(())
}
