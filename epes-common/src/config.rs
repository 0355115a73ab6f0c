//! Configuration loading and root folder resolution

use crate::model::RecordDefaults;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "EPES_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "epes.db";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub log_level: Option<String>,
    /// Overrides for the values pre-filled into new transformers
    pub defaults: RecordDefaults,
}

impl TomlConfig {
    /// Parse the config file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `EPES_ROOT_FOLDER` environment variable
/// 3. `root_folder` key of the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Path of the record database inside `root_folder`
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// Existing platform config file, if any
///
/// On Linux `~/.config/epes/config.toml` is preferred over
/// `/etc/epes/config.toml`; elsewhere only the user config directory is used.
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("epes").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/epes/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// `epes` under the local data directory
/// (`~/.local/share`, `~/Library/Application Support`, `%LOCALAPPDATA%`),
/// or `./epes_data` where the platform has none
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("epes"))
        .unwrap_or_else(|| PathBuf::from("./epes_data"))
}
