//! Playback engine client.
//!
//! The engine is a Liquidsoap instance exposing its line-based telnet server.
//! Each command opens a fresh connection, so concurrent callers never share
//! socket state.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("playback engine unreachable: {0}")]
    Io(#[from] std::io::Error),

    #[error("playback engine timed out after {0:?}")]
    Timeout(Duration),

    #[error("playback engine refused: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Queue a file for future playback. Success means accepted, not playing.
    async fn submit(&self, path: &Path) -> Result<(), PlaybackError>;

    /// Skip the track on air.
    async fn skip(&self) -> Result<(), PlaybackError>;
}

#[derive(Debug, Clone)]
pub struct Liquidsoap {
    addr: String,
    queue: String,
    output: String,
    timeout: Duration,
}

impl Liquidsoap {
    pub fn new(
        addr: impl Into<String>,
        queue: impl Into<String>,
        output: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            addr: addr.into(),
            queue: queue.into(),
            output: output.into(),
            timeout,
        }
    }

    /// Send one command line and collect the reply lines up to `END`.
    async fn command(&self, line: &str) -> Result<Vec<String>, PlaybackError> {
        let exchange = async {
            let stream = TcpStream::connect(&self.addr).await?;
            let (read, mut write) = stream.into_split();
            write.write_all(format!("{line}\n").as_bytes()).await?;

            let mut lines = BufReader::new(read).lines();
            let mut reply = Vec::new();
            while let Some(l) = lines.next_line().await? {
                let l = l.trim_end();
                if l == "END" {
                    break;
                }
                reply.push(l.to_string());
            }
            write.write_all(b"quit\n").await?;
            Ok::<_, std::io::Error>(reply)
        };

        let reply = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| PlaybackError::Timeout(self.timeout))??;

        if let Some(err) = reply
            .iter()
            .find(|l| l.starts_with("ERROR") || l.starts_with("Unknown command"))
        {
            return Err(PlaybackError::Rejected(err.clone()));
        }
        Ok(reply)
    }
}

#[async_trait]
impl PlaybackEngine for Liquidsoap {
    async fn submit(&self, path: &Path) -> Result<(), PlaybackError> {
        let Some(path) = path.to_str().filter(|p| !p.contains(['\n', '\r'])) else {
            return Err(PlaybackError::Rejected(format!(
                "path is not a single utf-8 line: {}",
                path.display()
            )));
        };
        let reply = self.command(&format!("{}.push {}", self.queue, path)).await?;
        tracing::info!("Queued {} (request id {:?})", path, reply.first());
        Ok(())
    }

    async fn skip(&self) -> Result<(), PlaybackError> {
        self.command(&format!("{}.skip", self.output)).await?;
        tracing::info!("Skipped current track on {}", self.output);
        Ok(())
    }
}
