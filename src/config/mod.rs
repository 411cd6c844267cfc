//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig) and loading
//! - [`listen`]: Network listener configuration (ListenConfig)
//! - [`limits`]: Per-connection resource limits (LimitsConfig)

mod limits;
mod listen;
mod types;

pub use limits::LimitsConfig;
pub use listen::{DEFAULT_PORT, ListenConfig};
pub use types::{Config, ConfigError, ConfigSource, ServerConfig};
