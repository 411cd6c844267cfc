//! The Hub - central shared state for the relay.
//!
//! Holds the registry, every open connection (named or not), and the
//! server's identity. One `Arc<Hub>` is shared by all connection tasks.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{ConnId, ConnIdGenerator, Peer, Registry};

/// Product name reported by `VERSION`.
pub const SERVER_NAME: &str = "GroupCast server";
/// Protocol version reported by `VERSION`.
pub const SERVER_VERSION: &str = "1.0";

/// This server's identity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    host: String,
    port: u16,
}

impl ServerInfo {
    /// Identity for a server bound at `bound`.
    ///
    /// Uses the configured host if any, else the bound IP, else `localhost`
    /// when bound to the unspecified address.
    pub fn new(configured_host: Option<&str>, bound: SocketAddr) -> Self {
        let host = match configured_host {
            Some(host) if !host.is_empty() => host.to_string(),
            _ if bound.ip().is_unspecified() => "localhost".to_string(),
            _ => bound.ip().to_string(),
        };
        Self {
            host,
            port: bound.port(),
        }
    }
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SERVER_NAME} {SERVER_VERSION} {}:{}", self.host, self.port)
    }
}

/// Process-wide shared state.
#[derive(Debug)]
pub struct Hub {
    /// Client and group tables.
    pub registry: Registry,

    /// Every open connection, indexed by id.
    pub connections: DashMap<ConnId, Arc<Peer>>,

    /// This server's identity.
    pub server_info: ServerInfo,

    conn_ids: ConnIdGenerator,
}

impl Hub {
    pub fn new(server_info: ServerInfo) -> Self {
        Self {
            registry: Registry::new(),
            connections: DashMap::new(),
            server_info,
            conn_ids: ConnIdGenerator::new(),
        }
    }

    /// Allocate a peer for a freshly accepted socket.
    ///
    /// Returns the peer and the receiving end of its outgoing queue.
    pub fn open_connection(
        &self,
        addr: SocketAddr,
        queue_depth: usize,
    ) -> (Arc<Peer>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let peer = Arc::new(Peer::new(self.conn_ids.next(), addr, tx, CancellationToken::new()));
        self.connections.insert(peer.id(), Arc::clone(&peer));
        (peer, rx)
    }

    /// Forget a connection. Safe to call more than once.
    pub fn close_connection(&self, id: ConnId) -> Option<Arc<Peer>> {
        self.connections.remove(&id).map(|(_, peer)| peer)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Refresh the named-client and active-group gauges.
    pub fn update_registry_gauges(&self) {
        crate::metrics::set_registry_sizes(
            self.registry.client_count(),
            self.registry.group_count(),
        );
    }

    /// Signal every open connection to close. Returns how many were signalled.
    pub fn close_all(&self) -> usize {
        // Clone out first so no shard lock is held while cancelling.
        let peers: Vec<Arc<Peer>> = self
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for peer in &peers {
            peer.close();
        }
        peers.len()
    }
}
