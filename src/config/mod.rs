pub mod types;

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".kube-doctor.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("Failed to write configuration file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Home directory could not be determined")]
    NoHomeDir,
}

/// Get the global config file path (~/.kube-doctor.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (<dir>/.kube-doctor.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Parse one configuration file.
pub fn load_config_file(path: &Path) -> Result<types::Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Locate the configuration file in effect, if any.
///
/// An explicit path always wins. Otherwise the local file in `dir` is tried
/// first, then the global one.
pub fn find_config_path(explicit: Option<&Path>, dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(local) = dir.map(local_config_path).filter(|p| p.exists()) {
        return Some(local);
    }
    global_config_path().filter(|p| p.exists())
}

/// Load configuration from file or use defaults.
///
/// An explicit path must exist. A file that exists but does not parse is an
/// error.
pub fn load_config(explicit: Option<&Path>, dir: Option<&Path>) -> Result<types::Config, ConfigError> {
    match find_config_path(explicit, dir) {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            load_config_file(&path)
        }
        None => {
            debug!("No configuration file found, using defaults");
            Ok(types::Config::default())
        }
    }
}

/// Write configuration to `path`.
pub fn save_config(config: &types::Config, path: &Path) -> Result<(), ConfigError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Save configuration to global config file
pub fn save_global_config(config: &types::Config) -> Result<(), ConfigError> {
    let path = global_config_path().ok_or(ConfigError::NoHomeDir)?;
    save_config(config, &path)
}
