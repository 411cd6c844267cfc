//! Network listener configuration.

use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};

/// Port used when none (or an invalid one) is given.
pub const DEFAULT_PORT: u16 = 20000;

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:20000").
    #[serde(default = "default_address")]
    pub address: SocketAddr,
}

impl ListenConfig {
    /// Listen on all interfaces at `port`.
    pub fn on_port(port: u16) -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))
}
