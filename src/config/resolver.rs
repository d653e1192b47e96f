//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags, including their environment variables
//! 2. config.kdl (`~/.config/lookout/config.kdl` or `--config`)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use super::schema::LookoutConfig;
use crate::Result;
use crate::dispatch::ProtocolPolicy;
use crate::transport::{DEFAULT_PORT, Endpoint, RECONNECT_INTERVAL_MS};

/// Default bridge host
pub const DEFAULT_HOST: &str = "localhost";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag or its environment variable
    CliFlag,
    /// Value from a config file
    Config(PathBuf),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Config(path) => write!(f, "config:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub host: Resolved<String>,
    pub port: Resolved<u16>,
    pub secure: Resolved<bool>,
    pub protocol: Resolved<ProtocolPolicy>,
    pub reconnect_interval_ms: Resolved<u64>,
    /// Unset means the default log location for the TUI
    pub log_file: Option<Resolved<PathBuf>>,
    /// Config file that was consulted (it may not exist)
    pub config_path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            host: Resolved::new(DEFAULT_HOST.to_string(), ValueSource::Default),
            port: Resolved::new(DEFAULT_PORT, ValueSource::Default),
            secure: Resolved::new(false, ValueSource::Default),
            protocol: Resolved::new(ProtocolPolicy::default(), ValueSource::Default),
            reconnect_interval_ms: Resolved::new(RECONNECT_INTERVAL_MS, ValueSource::Default),
            log_file: None,
            config_path: None,
        }
    }
}

impl ResolvedConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.host.value.clone(),
            self.port.value,
            self.secure.value,
        )
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms.value)
    }

    pub fn protocol(&self) -> ProtocolPolicy {
        self.protocol.value
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_ref().map(|r| r.value.as_path())
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// `--secure` can only switch TLS on
    pub secure: bool,
    pub protocol: Option<ProtocolPolicy>,
    pub log_file: Option<PathBuf>,
    /// Explicit config file instead of the default location
    pub config_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_protocol(mut self, protocol: ProtocolPolicy) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }
}

/// Default config location (`~/.config/lookout/config.kdl`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lookout").join("config.kdl"))
}

/// Default TUI log location (`~/.local/share/lookout/lookout.log`).
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("lookout").join("lookout.log"))
}

/// Load the config file named by `overrides` (or the default one) and resolve.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let path = overrides.config_path.clone().or_else(default_config_path);
    let file_config = match &path {
        Some(path) => LookoutConfig::load(path)?,
        None => LookoutConfig::new(),
    };
    let mut resolved = resolve_with(&file_config, path.as_deref(), overrides);
    resolved.config_path = path;
    Ok(resolved)
}

/// Apply precedence to an already loaded config.
pub fn resolve_with(
    file: &LookoutConfig,
    file_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> ResolvedConfig {
    let mut result = ResolvedConfig::default();
    let from_file = || ValueSource::Config(file_path.map(Path::to_path_buf).unwrap_or_default());

    if let Some(ref host) = overrides.host {
        result.host = Resolved::new(host.clone(), ValueSource::CliFlag);
    } else if let Some(ref host) = file.host {
        result.host = Resolved::new(host.clone(), from_file());
    }

    if let Some(port) = overrides.port {
        result.port = Resolved::new(port, ValueSource::CliFlag);
    } else if let Some(port) = file.port {
        result.port = Resolved::new(port, from_file());
    }

    if overrides.secure {
        result.secure = Resolved::new(true, ValueSource::CliFlag);
    } else if let Some(secure) = file.secure {
        result.secure = Resolved::new(secure, from_file());
    }

    if let Some(protocol) = overrides.protocol {
        result.protocol = Resolved::new(protocol, ValueSource::CliFlag);
    } else if let Some(protocol) = file.protocol {
        result.protocol = Resolved::new(protocol, from_file());
    }

    if let Some(ms) = file.reconnect_interval_ms {
        result.reconnect_interval_ms = Resolved::new(ms, from_file());
    }

    if let Some(ref path) = overrides.log_file {
        result.log_file = Some(Resolved::new(path.clone(), ValueSource::CliFlag));
    } else if let Some(ref path) = file.log_file {
        result.log_file = Some(Resolved::new(path.clone(), from_file()));
    }

    result
}
