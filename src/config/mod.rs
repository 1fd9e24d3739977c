pub mod ranges;
mod schema;
mod settings;

pub use schema::{Config, MonthSpec, ScanConfig};
pub use settings::Settings;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the config directory path (~/.config/forage-scout/)
pub fn get_config_dir() -> PathBuf {
    // Without a home directory, fall back to a relative path that won't exist
    let home = dirs::home_dir().unwrap_or_default();
    home.join(".config").join("forage-scout")
}

/// Get the default config file path (~/.config/forage-scout/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path
///   (~/.config/forage-scout/config.yaml) and falls back to built-in defaults
///   when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let (config_path, explicit) = match path {
        Some(p) => (p, true),
        None => (get_config_path(), false),
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    parse_config(&config_content, &config_path)
}

/// Parse YAML config text. `origin` is only used in error messages.
pub fn parse_config(content: &str, origin: &Path) -> Result<Config> {
    // An empty document deserializes to nothing rather than an empty map
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_saphyr::from_str(content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", origin.display()))
}

/// The fully populated default config as YAML, suitable as a starting file.
pub fn default_config_yaml() -> Result<String> {
    serde_saphyr::to_string(&Config::populated_defaults())
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
}

/// Write the default config to `path`, creating parent directories.
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let yaml = default_config_yaml()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::write(path, &yaml)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
}
