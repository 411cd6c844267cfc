//! Connection handle shared between the owning connection task and the
//! registry.

use std::net::SocketAddr;
use std::sync::OnceLock;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ConnId;
use crate::error::SendError;

/// The registry's view of one connection.
///
/// Other connections may push lines into its outgoing queue or force it
/// closed; only the owning task reads from it.
#[derive(Debug)]
pub struct Peer {
    id: ConnId,
    addr: SocketAddr,
    name: OnceLock<String>,
    outgoing: mpsc::Sender<String>,
    shutdown: CancellationToken,
}

impl Peer {
    pub fn new(
        id: ConnId,
        addr: SocketAddr,
        outgoing: mpsc::Sender<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            addr,
            name: OnceLock::new(),
            outgoing,
            shutdown,
        }
    }

    #[inline]
    pub fn id(&self) -> ConnId {
        self.id
    }

    #[inline]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The client name, once `NAME` has succeeded.
    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Record the client name. Returns false if a name was already set.
    pub(crate) fn set_name(&self, name: &str) -> bool {
        self.name.set(name.to_string()).is_ok()
    }

    /// Queue a line for the writer. Never waits.
    pub fn send_line(&self, line: String) -> Result<(), SendError> {
        if self.shutdown.is_cancelled() {
            return Err(SendError::Closed);
        }
        self.outgoing.try_send(line)?;
        Ok(())
    }

    /// Queue a reply to this connection's own command, waiting for room.
    ///
    /// Only the owning task calls this, so a slow client slows its own
    /// reads instead of losing replies.
    pub async fn send_reply(&self, line: String) -> Result<(), SendError> {
        if self.shutdown.is_cancelled() {
            return Err(SendError::Closed);
        }
        self.outgoing.send(line).await.map_err(|_| SendError::Closed)
    }

    /// Force the connection closed. The owning task notices on its next
    /// read and runs its cleanup.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Token the owning task selects on.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
