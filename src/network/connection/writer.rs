//! Outgoing half of a connection.
//!
//! Drains the peer's queue into the socket. Stops when every sender is gone
//! (normal end, queue fully flushed) or when the peer is force-closed.

use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use groupcast_proto::{LineCodec, ProtocolError};

/// How the writer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterExit {
    /// Queue closed and fully written.
    Drained,
    /// Shutdown signalled; queued lines may have been dropped.
    Cancelled,
}

/// Write queued lines until the queue closes or `shutdown` fires.
pub async fn write_loop<W>(
    writer: W,
    mut outgoing: mpsc::Receiver<String>,
    shutdown: CancellationToken,
) -> Result<WriterExit, ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, LineCodec::new());
    let mut written: u64 = 0;

    let exit = loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break WriterExit::Cancelled,
            line = outgoing.recv() => line,
        };
        let Some(line) = line else {
            break WriterExit::Drained;
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break WriterExit::Cancelled,
            sent = sink.send(line) => sent?,
        }
        written += 1;
    };

    debug!(written, ?exit, "Writer finished");
    Ok(exit)
}
