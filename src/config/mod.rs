//! Configuration for Lookout.
//!
//! ## config.kdl - User preferences
//!
//! Located at `~/.config/lookout/config.kdl` unless `--config` names another
//! file. Contains:
//! - `host`, `port`, `secure` - where the debug bridge listens
//! - `protocol` - "structured", "legacy" or "follow"
//! - `reconnect-interval-ms` - delay between reconnect attempts
//! - `log-file` - where the TUI writes its log
//!
//! ## Precedence
//!
//! CLI flag (or its env var) > config.kdl > defaults
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DEFAULT_HOST, Resolved, ResolvedConfig, ValueSource, default_config_path,
    default_log_path, resolve_config, resolve_with,
};
pub use schema::LookoutConfig;
