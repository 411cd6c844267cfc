//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::limits::LimitsConfig;
use super::listen::ListenConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
}

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Per-connection limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server identity configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Host name reported by VERSION (default: the bound address).
    pub host: Option<String>,
    /// Prometheus metrics HTTP port (default: disabled, 0 also disables).
    pub metrics_port: Option<u16>,
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No arguments: built-in defaults.
    Defaults,
    /// A port given on the command line.
    Port(u16),
    /// An unusable port argument; defaults were used instead.
    InvalidPort(String),
    /// A TOML file given with `--config`.
    File(PathBuf),
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build the configuration from command-line arguments (program name excluded).
    ///
    /// Accepts `[PORT]` or `--config <FILE>`. A port that does not parse
    /// falls back to the defaults rather than failing.
    pub fn from_args<I>(args: I) -> Result<(Self, ConfigSource), ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(first) = args.next() else {
            return Ok((Config::default(), ConfigSource::Defaults));
        };

        if first == "--config" || first == "-c" {
            let path = args.next().ok_or(ConfigError::MissingValue("--config"))?;
            let config = Config::load(&path)?;
            return Ok((config, ConfigSource::File(PathBuf::from(path))));
        }

        match first.parse::<u16>() {
            Ok(port) => {
                let config = Config {
                    listen: ListenConfig::on_port(port),
                    ..Config::default()
                };
                Ok((config, ConfigSource::Port(port)))
            }
            Err(_) => Ok((Config::default(), ConfigSource::InvalidPort(first))),
        }
    }

    /// Metrics port, if the HTTP endpoint is enabled.
    pub fn metrics_port(&self) -> Option<u16> {
        self.server.metrics_port.filter(|port| *port != 0)
    }
}
