//! Test server management.
//!
//! Spawns and manages groupcast instances for integration testing.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::sleep;

/// A test server instance. Killed on drop.
pub struct TestServer {
    child: Child,
    port: u16,
    _data_dir: tempfile::TempDir,
}

impl TestServer {
    /// Spawn a server on a free local port with a small send queue.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(None).await
    }

    /// Spawn a server that also serves `/metrics`. Returns the metrics port.
    #[allow(dead_code)]
    pub async fn spawn_with_metrics() -> anyhow::Result<(Self, u16)> {
        let metrics_port = free_port()?;
        let server = Self::spawn_with(Some(metrics_port)).await?;
        Ok((server, metrics_port))
    }

    async fn spawn_with(metrics_port: Option<u16>) -> anyhow::Result<Self> {
        let port = free_port()?;
        let data_dir = tempfile::tempdir()?;

        let metrics_line = metrics_port
            .map(|p| format!("metrics_port = {p}"))
            .unwrap_or_default();
        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
host = "test.server"
{metrics_line}

[listen]
address = "127.0.0.1:{port}"

[limits]
max_line_length = 1024
send_queue = 64
drain_timeout_ms = 500
"#
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(binary_path())
            .arg("--config")
            .arg(&config_path)
            .spawn()?;

        let server = Self {
            child,
            port,
            _data_dir: data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    /// Spawn a server taking its port from the command line.
    #[allow(dead_code)]
    pub async fn spawn_on_port_arg() -> anyhow::Result<(Self, u16)> {
        let port = free_port()?;
        let child = Command::new(binary_path()).arg(port.to_string()).spawn()?;
        let server = Self {
            child,
            port,
            _data_dir: tempfile::tempdir()?,
        };
        server.wait_until_ready().await?;
        Ok((server, port))
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Create a new test client connected to this server.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address()).await
    }

    /// Create a client and claim `name` with it.
    pub async fn connect_named(&self, name: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = self.connect().await?;
        client.expect_ok(&format!("NAME,{name}"), &format!("NAME,{name}")).await?;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_groupcast"))
}

/// Ask the OS for a port that is free right now.
fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
