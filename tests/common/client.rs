//! Test client.
//!
//! A line-based client that sends commands and asserts on the replies.

use groupcast_proto::Reply;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A test client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    /// Send a raw line, adding the terminator.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single raw line, without its terminator.
    ///
    /// Returns `None` when the server closed the connection.
    pub async fn recv_line(&mut self) -> anyhow::Result<Option<String>> {
        self.recv_line_timeout(Duration::from_secs(5)).await
    }

    pub async fn recv_line_timeout(&mut self, dur: Duration) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            return Ok(None);
        }
        anyhow::ensure!(line.ends_with("\r\n"), "line not CRLF terminated: {line:?}");
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Receive and parse a single reply.
    pub async fn recv(&mut self) -> anyhow::Result<Reply> {
        let line = self
            .recv_line()
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed"))?;
        line.parse::<Reply>()
            .map_err(|e| anyhow::anyhow!("Parse error: {e}"))
    }

    /// Send `line` and return the reply.
    pub async fn request(&mut self, line: &str) -> anyhow::Result<Reply> {
        self.send_raw(line).await?;
        self.recv().await
    }

    /// Send `line` and assert the reply is `+OK,<expected>`.
    pub async fn expect_ok(&mut self, line: &str, expected: &str) -> anyhow::Result<()> {
        let reply = self.request(line).await?;
        anyhow::ensure!(
            reply == Reply::ok(expected),
            "{line}: expected +OK,{expected}, got {reply}"
        );
        Ok(())
    }

    /// Send `line` and assert the reply is `+ERROR,<expected>`.
    pub async fn expect_error(&mut self, line: &str, expected: &str) -> anyhow::Result<()> {
        let reply = self.request(line).await?;
        anyhow::ensure!(
            reply == Reply::error(expected),
            "{line}: expected +ERROR,{expected}, got {reply}"
        );
        Ok(())
    }

    /// Assert nothing arrives within `dur`.
    #[allow(dead_code)]
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_line_timeout(dur).await {
            Err(_) => Ok(()),
            Ok(line) => anyhow::bail!("expected silence, got {line:?}"),
        }
    }

    /// Wait until the server closes the connection.
    #[allow(dead_code)]
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        // Lines already in flight may still arrive before EOF.
        while self.recv_line().await?.is_some() {}
        Ok(())
    }
}
