//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listening socket and spawns a Connection task for
//! each incoming client.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::config::{Config, LimitsConfig};
use crate::network::Connection;
use crate::state::{Hub, ServerInfo};

/// Grace period for connection tasks to finish after shutdown is signalled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    hub: Arc<Hub>,
    limits: LimitsConfig,
}

impl Gateway {
    /// Bind the gateway to the configured address.
    ///
    /// The server identity is derived from the address actually bound, so
    /// binding port 0 reports the ephemeral port chosen.
    pub async fn bind(config: &Config) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.listen.address).await?;
        let local_addr = listener.local_addr()?;
        let server_info = ServerInfo::new(config.server.host.as_deref(), local_addr);
        info!(addr = %local_addr, identity = %server_info, "Listener bound");

        Ok(Self {
            listener,
            hub: Arc::new(Hub::new(server_info)),
            limits: config.limits.clone(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    #[cfg(test)]
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Accept connections until `shutdown` resolves, then close every open
    /// connection and wait (bounded) for their cleanup.
    #[instrument(skip(self, shutdown), name = "gateway")]
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let connection = Connection::new(
                            stream,
                            addr,
                            Arc::clone(&self.hub),
                            self.limits.clone(),
                        );
                        info!(conn = connection.peer().id(), %addr, "Connection accepted");
                        tasks.spawn(async move {
                            if let Err(e) = connection.run().await {
                                warn!(%addr, error = %e, "Connection error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Connection task panicked");
                    }
                }
            }
        }

        drop(self.listener);
        let closing = self.hub.close_all();
        info!(connections = closing, "Shutting down, closing connections");

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = tasks.len(), "Connections did not close in time, aborting");
            tasks.abort_all();
        }

        info!("Gateway stopped");
        Ok(())
    }
}
