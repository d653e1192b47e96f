//! Lookout - a terminal live view for a paused Python debuggee.
//!
//! The library keeps a display consistent with state pushed by a debug
//! bridge over a WebSocket, and turns user intents into outbound actions:
//!
//! ```text
//! transport -> protocol -> session -> render -> (intent) -> dispatch -> protocol -> transport
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod live;
pub mod navigator;
pub mod protocol;
pub mod render;
pub mod session;
pub mod transport;
#[cfg(feature = "tui")]
pub mod tui;

/// Library-level error type for Lookout operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Undecodable frame: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Lookout operations.
pub type Result<T> = std::result::Result<T, Error>;
