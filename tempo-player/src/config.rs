//! Runtime configuration for tempo-player
//!
//! Merges command-line overrides onto the TOML bootstrap file (see
//! [`tempo_common::config`]). Priority, highest first: CLI argument,
//! environment variable, TOML file, built-in default.

use crate::error::{Error, Result};
use crate::playback::CoordinatorConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempo_common::config::{resolve_root_folder, TomlConfig, MIN_POLL_INTERVAL_MS};
use tempo_common::time::millis_to_duration;
use tracing::info;

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "TEMPO_ROOT_FOLDER";

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub root_folder: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub port: u16,
    /// Media library folder; relative uris resolve against it
    pub root_folder: PathBuf,
    /// Progress loop cadence
    pub poll_interval: Duration,
    /// Events buffered per subscriber before it is dropped
    pub client_queue_capacity: usize,
    /// Default tracing level when RUST_LOG is unset
    pub log_level: String,
}

impl Config {
    /// Load the TOML file (explicit path or platform default) and apply overrides
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let toml = TomlConfig::load_or_default(config_path)?;
        Self::resolve(&toml, overrides)
    }

    pub fn resolve(toml: &TomlConfig, overrides: &Overrides) -> Result<Self> {
        let poll_interval_ms = overrides.poll_interval_ms.unwrap_or(toml.poll_interval_ms);
        if poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(Error::Config(format!(
                "poll interval must be at least {} ms (got {})",
                MIN_POLL_INTERVAL_MS, poll_interval_ms
            )));
        }

        let port = overrides.port.unwrap_or(toml.port);
        if port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }

        let root_folder =
            resolve_root_folder(overrides.root_folder.as_deref(), ROOT_FOLDER_ENV, toml);
        info!("Root folder: {}", root_folder.display());

        Ok(Self {
            port,
            root_folder,
            poll_interval: millis_to_duration(poll_interval_ms),
            client_queue_capacity: toml.client_queue_capacity,
            log_level: toml.logging.level.clone(),
        })
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            poll_interval: self.poll_interval,
            client_queue_capacity: self.client_queue_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_common::config::{
        DEFAULT_CLIENT_QUEUE_CAPACITY, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT,
    };

    fn toml_with_root() -> TomlConfig {
        TomlConfig::from_toml_str("root_folder = \"/srv/music\"\npoll_interval_ms = 250").unwrap()
    }

    #[test]
    fn test_toml_values_fill_missing_overrides() {
        let config = Config::resolve(&toml_with_root(), &Overrides {
            root_folder: Some(PathBuf::from("/cli/music")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_cli_overrides_win() {
        let overrides = Overrides {
            port: Some(6100),
            root_folder: Some(PathBuf::from("/cli/music")),
            poll_interval_ms: Some(50),
        };
        let config = Config::resolve(&toml_with_root(), &overrides).unwrap();
        assert_eq!(config.port, 6100);
        assert_eq!(config.root_folder, PathBuf::from("/cli/music"));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(
            config.coordinator_config().poll_interval,
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_poll_interval_override_below_minimum_rejected() {
        let overrides = Overrides {
            root_folder: Some(PathBuf::from("/cli/music")),
            poll_interval_ms: Some(MIN_POLL_INTERVAL_MS - 1),
            ..Default::default()
        };
        let result = Config::resolve(&TomlConfig::default(), &overrides);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_poll_interval() {
        let overrides = Overrides {
            root_folder: Some(PathBuf::from("/cli/music")),
            ..Default::default()
        };
        let config = Config::resolve(&TomlConfig::default(), &overrides).unwrap();
        assert_eq!(
            config.poll_interval,
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
        assert_eq!(
            config.coordinator_config().client_queue_capacity,
            DEFAULT_CLIENT_QUEUE_CAPACITY
        );
    }

    #[test]
    fn test_client_queue_capacity_from_toml() {
        let toml = TomlConfig::from_toml_str(
            "root_folder = \"/srv/music\"\nclient_queue_capacity = 8",
        )
        .unwrap();
        let config = Config::resolve(&toml, &Overrides::default()).unwrap();
        assert_eq!(config.coordinator_config().client_queue_capacity, 8);
    }

    #[test]
    #[serial_test::serial]
    fn test_root_folder_env_beats_toml() {
        std::env::set_var(ROOT_FOLDER_ENV, "/env/music");
        let config = Config::resolve(&toml_with_root(), &Overrides::default());
        std::env::remove_var(ROOT_FOLDER_ENV);

        assert_eq!(config.unwrap().root_folder, PathBuf::from("/env/music"));
    }

    #[test]
    #[serial_test::serial]
    fn test_root_folder_from_toml_without_env() {
        std::env::remove_var(ROOT_FOLDER_ENV);
        let config = Config::resolve(&toml_with_root(), &Overrides::default()).unwrap();
        assert_eq!(config.root_folder, PathBuf::from("/srv/music"));
    }
}
