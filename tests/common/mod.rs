//! Common test utilities for lookout integration tests.
//!
//! Provides `TestEnv` for isolated config directories and `Bridge`, a
//! loopback WebSocket server standing in for the debug bridge.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use assert_cmd::Command;
use futures::{SinkExt, StreamExt};
pub use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// A test environment with an isolated config file.
///
/// The `lookout()` method returns a `Command` that points `--config` at the
/// temporary file and clears the connection env vars, making tests
/// parallel-safe.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.kdl")
    }

    /// Write config.kdl with the given contents.
    pub fn write_config(&self, kdl: &str) {
        std::fs::write(self.config_path(), kdl).expect("Failed to write config file");
    }

    /// Get a Command for the lookout binary using this environment's config.
    pub fn lookout(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lookout"));
        cmd.env("LOOKOUT_CONFIG", self.config_path());
        cmd.env_remove("LOOKOUT_HOST");
        cmd.env_remove("LOOKOUT_PORT");
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

/// What the bridge does with each accepted connection.
#[derive(Debug, Clone)]
pub struct Script {
    /// Inbound frames to read before pushing anything
    pub expect_frames: usize,
    /// Frames pushed once `expect_frames` arrived
    pub push: Vec<String>,
    /// Close the socket after pushing
    pub hang_up: bool,
}

/// A frame received by the bridge, tagged with the connection it arrived on.
#[derive(Debug, Clone)]
pub struct Received {
    pub connection: usize,
    pub frame: String,
}

/// Loopback WebSocket server on 127.0.0.1. Connection `n` follows
/// `scripts[n]`; connections past the end of the list follow the last one.
pub struct Bridge {
    pub addr: SocketAddr,
    pub received: mpsc::UnboundedReceiver<Received>,
}

impl Bridge {
    pub async fn start(scripts: Vec<Script>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, received) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut connection = 0;
            while let Ok((stream, _)) = listener.accept().await {
                let script = scripts
                    .get(connection)
                    .or_else(|| scripts.last())
                    .cloned()
                    .unwrap();
                let tx = tx.clone();
                let index = connection;
                tokio::spawn(async move {
                    serve(stream, index, script, tx).await;
                });
                connection += 1;
            }
        });

        Self { addr, received }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn serve(
    stream: tokio::net::TcpStream,
    connection: usize,
    script: Script,
    tx: mpsc::UnboundedSender<Received>,
) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };

    let mut seen = 0;
    while seen < script.expect_frames {
        match ws.next().await {
            Some(Ok(Message::Text(frame))) => {
                seen += 1;
                let _ = tx.send(Received { connection, frame });
            }
            Some(Ok(_)) => {}
            _ => return,
        }
    }

    for frame in script.push {
        if ws.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }

    if script.hang_up {
        let _ = ws.close(None).await;
        return;
    }

    while let Some(Ok(msg)) = ws.next().await {
        if let Message::Text(frame) = msg {
            let _ = tx.send(Received { connection, frame });
        }
    }
}

pub const VARIABLES_FRAME: &str = r#"{"type":"variables","payload":{"variables":[{"names":["head"],"pyType":"Node","value":{"kind":"composite","repr":"refid:7"},"scope":"local","id":"42"}]}}"#;
