//! Configuration loading and config file resolution
//!
//! Every service reads the same TOML file and picks the sections it needs.
//! Values resolve in this order:
//! 1. Command-line argument (or its bound environment variable)
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing config file is not an error: the service logs a warning and
//! starts on compiled defaults. A config file that exists but fails to parse
//! is fatal.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "TRACKPD_CONFIG";

/// Default credential file name, relative to the working directory
pub const DEFAULT_CREDENTIALS_FILE: &str = "track-pd-credentials.json";

/// `[store]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Path to the store credential file
    pub credentials: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Locate the config file.
///
/// Priority: explicit path → `TRACKPD_CONFIG` → `~/.config/trackpd/config.toml`
/// → `/etc/trackpd/config.toml`. Returns `None` when nothing applies; the
/// explicit and environment paths are returned even if they do not exist so
/// the loader can report them.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("trackpd").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/trackpd/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Load a TOML config file into `T`, falling back to `T::default()` when the
/// file is absent.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        warn!("No config file found; using compiled defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found; using compiled defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// Resolve `path` against the directory holding `anchor_file` when relative
pub fn resolve_relative_to(anchor_file: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match anchor_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_keeps_absolute() {
        let resolved = resolve_relative_to(Path::new("/etc/trackpd/creds.json"), Path::new("/data/store.db"));
        assert_eq!(resolved, PathBuf::from("/data/store.db"));
    }

    #[test]
    fn test_resolve_relative_joins_anchor_dir() {
        let resolved = resolve_relative_to(Path::new("/etc/trackpd/creds.json"), Path::new("store.db"));
        assert_eq!(resolved, PathBuf::from("/etc/trackpd/store.db"));
    }

    #[test]
    fn test_resolve_relative_bare_anchor() {
        let resolved = resolve_relative_to(Path::new("creds.json"), Path::new("store.db"));
        assert_eq!(resolved, PathBuf::from("store.db"));
    }

    #[test]
    fn test_section_defaults() {
        assert_eq!(StoreSection::default().credentials, PathBuf::from(DEFAULT_CREDENTIALS_FILE));
        assert_eq!(LoggingConfig::default().level, "info");
    }
}
