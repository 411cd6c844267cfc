//! Connection - handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task:
//!
//! ```text
//!   socket read half ──FramedRead<LineCodec>──▶ Session ──▶ reply
//!                                                             │
//!   other connections ──(relayed +MSG lines)──┐               │
//!                                             ▼               ▼
//!                                       outgoing queue (mpsc, bounded)
//!                                             │
//!   socket write half ◀──FramedWrite─── writer task
//! ```
//!
//! Whatever ends the read loop (EOF, read error, `BYE`, forced close), the
//! connection leaves through [`Connection::finish`] exactly once.

mod writer;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, instrument, warn};

use crate::config::LimitsConfig;
use crate::handlers::Session;
use crate::state::{Hub, Peer};
use groupcast_proto::{LineCodec, ProtocolError};

use writer::WriterExit;

/// Why the read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadExit {
    /// Client closed its side.
    Eof,
    /// Client sent `BYE`.
    Bye,
    /// Another connection or server shutdown closed us.
    Closed,
}

/// A client connection handler.
pub struct Connection {
    stream: TcpStream,
    peer: Arc<Peer>,
    outgoing: mpsc::Receiver<String>,
    hub: Arc<Hub>,
    limits: LimitsConfig,
}

impl Connection {
    /// Register a freshly accepted socket with the hub.
    pub fn new(stream: TcpStream, addr: SocketAddr, hub: Arc<Hub>, limits: LimitsConfig) -> Self {
        let (peer, outgoing) = hub.open_connection(addr, limits.send_queue);
        crate::metrics::set_open_connections(hub.connection_count());
        Self {
            stream,
            peer,
            outgoing,
            hub,
            limits,
        }
    }

    pub fn peer(&self) -> &Arc<Peer> {
        &self.peer
    }

    /// Run the connection to completion.
    ///
    /// Cleanup always runs; a transport error is returned after it.
    #[instrument(
        skip(self),
        name = "connection",
        fields(conn = self.peer.id(), addr = %self.peer.addr())
    )]
    pub async fn run(self) -> Result<(), ProtocolError> {
        let Connection {
            stream,
            peer,
            outgoing,
            hub,
            limits,
        } = self;

        let (read_half, write_half) = stream.into_split();
        let writer = tokio::spawn(writer::write_loop(
            write_half,
            outgoing,
            peer.shutdown_token().clone(),
        ));

        let mut lines = FramedRead::new(read_half, LineCodec::with_max_len(limits.max_line_length));
        let mut session = Session::new(Arc::clone(&hub), Arc::clone(&peer));

        let result = Self::read_loop(&mut session, &mut lines).await;
        drop(session);
        drop(lines);

        Self::finish(&hub, peer, writer, Duration::from_millis(limits.drain_timeout_ms)).await;

        match result {
            Ok(exit) => {
                debug!(?exit, "Read loop ended");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Connection terminated by transport error");
                Err(e)
            }
        }
    }

    async fn read_loop<R>(
        session: &mut Session,
        lines: &mut FramedRead<R, LineCodec>,
    ) -> Result<ReadExit, ProtocolError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let peer = Arc::clone(session.peer());
        let shutdown = peer.shutdown_token().clone();

        loop {
            let frame = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(ReadExit::Closed),
                frame = lines.next() => frame,
            };

            let line = match frame {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(e),
                None => return Ok(ReadExit::Eof),
            };

            let reply = session.process_line(&line).to_string();
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(ReadExit::Closed),
                sent = peer.send_reply(reply) => {
                    if sent.is_err() {
                        return Ok(ReadExit::Closed);
                    }
                }
            }

            if !session.is_running() {
                return Ok(if peer.is_running() {
                    ReadExit::Bye
                } else {
                    ReadExit::Closed
                });
            }
        }
    }

    /// The single cleanup path.
    ///
    /// Releases the name and memberships first so no new relayed lines are
    /// routed here, then gives the writer a bounded time to flush what is
    /// already queued.
    async fn finish(
        hub: &Hub,
        peer: Arc<Peer>,
        writer: JoinHandle<Result<WriterExit, ProtocolError>>,
        drain_timeout: Duration,
    ) {
        let removal = hub.registry.remove_client(&peer);
        hub.close_connection(peer.id());
        crate::metrics::set_open_connections(hub.connection_count());
        hub.update_registry_gauges();

        let shutdown = peer.shutdown_token().clone();
        // The writer sees its queue close once the last Peer handle is gone.
        drop(peer);

        let mut writer = writer;
        match tokio::time::timeout(drain_timeout, &mut writer).await {
            Ok(Ok(Ok(exit))) => debug!(?exit, "Writer stopped"),
            Ok(Ok(Err(e))) => debug!(error = %e, "Writer failed"),
            Ok(Err(e)) => warn!(error = %e, "Writer task panicked"),
            Err(_) => {
                debug!("Drain timed out, dropping queued output");
                shutdown.cancel();
                if tokio::time::timeout(Duration::from_millis(100), &mut writer).await.is_err() {
                    writer.abort();
                }
            }
        }
        shutdown.cancel();

        info!(
            name = removal.name.as_deref().unwrap_or("-"),
            groups_left = removal.groups_left.len(),
            groups_deleted = removal.groups_deleted.len(),
            "Client connection terminated"
        );
    }
}
