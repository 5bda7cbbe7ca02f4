//! Configuration loading utilities
//!
//! Supports loading configuration from multiple sources in priority order:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Config file (searched in standard locations)
//! 4. Built-in defaults (lowest priority)

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::APP_NAME;

/// Describes where a configuration was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicit path provided via CLI or env var
    Explicit(PathBuf),
    /// Found in current working directory
    CurrentDir(PathBuf),
    /// Found in XDG config home (~/.config/metargram/)
    XdgConfig(PathBuf),
    /// Found in system config (/etc/metargram/)
    System(PathBuf),
    /// No config file found, using defaults
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ConfigSource::Explicit(p)
            | ConfigSource::CurrentDir(p)
            | ConfigSource::XdgConfig(p)
            | ConfigSource::System(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(path) => write!(f, "{}", path.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

/// Find a configuration file in standard locations
///
/// Search order:
/// 1. Environment variable (e.g., METARGRAM_CONFIG)
/// 2. Current directory
/// 3. XDG config home ($XDG_CONFIG_HOME/metargram/ or ~/.config/metargram/)
/// 4. System config (/etc/metargram/)
pub fn find_config_file(env_var: &str, filename: &str) -> ConfigSource {
    if let Ok(path) = env::var(env_var) {
        let path = PathBuf::from(&path);
        if path.exists() {
            return ConfigSource::Explicit(path);
        }
    }

    let local = PathBuf::from(filename);
    if local.exists() {
        return ConfigSource::CurrentDir(local);
    }

    let xdg = xdg_config_home().join(APP_NAME).join(filename);
    if xdg.exists() {
        return ConfigSource::XdgConfig(xdg);
    }

    let system = PathBuf::from("/etc").join(APP_NAME).join(filename);
    if system.exists() {
        return ConfigSource::System(system);
    }

    ConfigSource::Defaults
}

fn xdg_config_home() -> PathBuf {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config)
    } else if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".config")
    } else {
        // won't exist but keeps the search total
        PathBuf::from(".config")
    }
}

/// Load and parse a TOML configuration file
///
/// `Defaults` yields `T::default()`; a file that fails to read or parse is
/// an error for the caller to decide on.
pub fn load_config<T: DeserializeOwned + Default>(source: &ConfigSource) -> anyhow::Result<T> {
    match source.path() {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, serde::Deserialize, PartialEq)]
    struct TestConfig {
        station: Option<String>,
        hours: Option<u64>,
    }

    #[test]
    fn test_config_source_display() {
        let source = ConfigSource::CurrentDir(PathBuf::from("test.toml"));
        assert_eq!(format!("{}", source), "test.toml");

        let source = ConfigSource::Defaults;
        assert_eq!(format!("{}", source), "(defaults)");
    }

    #[test]
    fn test_defaults_source_loads_default_value() {
        let config: TestConfig = load_config(&ConfigSource::Defaults).unwrap();
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn test_explicit_file_loads_and_parses() {
        let path = env::temp_dir().join("metargram-config-test.toml");
        fs::write(&path, "station = \"KBOS\"\nhours = 6\n").unwrap();

        let config: TestConfig =
            load_config(&ConfigSource::Explicit(path.clone())).unwrap();
        assert_eq!(config.station.as_deref(), Some("KBOS"));
        assert_eq!(config.hours, Some(6));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let source = ConfigSource::Explicit(PathBuf::from("/nonexistent/metargram.toml"));
        assert!(load_config::<TestConfig>(&source).is_err());
    }
}
