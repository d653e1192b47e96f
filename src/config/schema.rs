//! KDL schema for config.kdl.
//!
//! ```kdl
//! host "localhost"
//! port 8025
//! secure #false
//! protocol "structured"   // or "legacy", "follow"
//! reconnect-interval-ms 5000
//! log-file "/tmp/lookout.log"
//! ```
//!
//! Unknown nodes are ignored. A node with a value of the wrong type or out of
//! range is a configuration error.

use std::path::{Path, PathBuf};

use kdl::{KdlDocument, KdlNode, KdlValue};
use serde::Serialize;

use crate::dispatch::ProtocolPolicy;
use crate::{Error, Result};

/// Settings read from config.kdl. Every field is optional; unset fields fall
/// through to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookoutConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: Option<bool>,
    pub protocol: Option<ProtocolPolicy>,
    pub reconnect_interval_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl LookoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from a KDL document.
    pub fn from_kdl(doc: &KdlDocument) -> std::result::Result<Self, String> {
        let mut config = Self::new();

        if let Some(node) = doc.get("host") {
            config.host = Some(string_arg(node)?.to_string());
        }

        if let Some(node) = doc.get("port") {
            let port = integer_arg(node)?;
            config.port =
                Some(u16::try_from(port).map_err(|_| format!("port out of range: {}", port))?);
        }

        if let Some(node) = doc.get("secure") {
            config.secure = Some(
                first_value(node)?
                    .as_bool()
                    .ok_or_else(|| "secure must be #true or #false".to_string())?,
            );
        }

        if let Some(node) = doc.get("protocol") {
            let name = string_arg(node)?;
            config.protocol = Some(ProtocolPolicy::parse(name).ok_or_else(|| {
                format!(
                    "protocol must be structured, legacy or follow, got {:?}",
                    name
                )
            })?);
        }

        if let Some(node) = doc.get("reconnect-interval-ms") {
            let ms = integer_arg(node)?;
            config.reconnect_interval_ms = Some(
                u64::try_from(ms)
                    .map_err(|_| format!("reconnect-interval-ms out of range: {}", ms))?,
            );
        }

        if let Some(node) = doc.get("log-file") {
            config.log_file = Some(PathBuf::from(string_arg(node)?));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges that the types alone do not capture.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err("host must not be empty".to_string());
            }
        }
        if self.port == Some(0) {
            return Err("port must be 1-65535".to_string());
        }
        if self.reconnect_interval_ms == Some(0) {
            return Err("reconnect-interval-ms must be positive".to_string());
        }
        Ok(())
    }

    /// Load config from a file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let doc: KdlDocument = content.parse().map_err(|e| {
            Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e))
        })?;

        Self::from_kdl(&doc).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

fn first_value(node: &KdlNode) -> std::result::Result<&KdlValue, String> {
    node.entries()
        .first()
        .map(|e| e.value())
        .ok_or_else(|| format!("{} needs a value", node.name().value()))
}

fn string_arg(node: &KdlNode) -> std::result::Result<&str, String> {
    first_value(node)?
        .as_string()
        .ok_or_else(|| format!("{} must be a string", node.name().value()))
}

fn integer_arg(node: &KdlNode) -> std::result::Result<i128, String> {
    first_value(node)?
        .as_integer()
        .ok_or_else(|| format!("{} must be an integer", node.name().value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(kdl: &str) -> std::result::Result<LookoutConfig, String> {
        let doc: KdlDocument = kdl.parse().unwrap();
        LookoutConfig::from_kdl(&doc)
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
            host "debug.local"
            port 9000
            secure #true
            protocol "follow"
            reconnect-interval-ms 250
            log-file "/tmp/lookout.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.host.as_deref(), Some("debug.local"));
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.secure, Some(true));
        assert_eq!(config.protocol, Some(ProtocolPolicy::Follow));
        assert_eq!(config.reconnect_interval_ms, Some(250));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/lookout.log")));
    }

    #[test]
    fn test_empty_document_is_empty_config() {
        assert_eq!(parse("").unwrap(), LookoutConfig::default());
    }

    #[test]
    fn test_unknown_nodes_ignored() {
        let config = parse("theme \"dark\"\nport 8025\n").unwrap();
        assert_eq!(config.port, Some(8025));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse("port 70000").is_err());
        assert!(parse("port 0").is_err());
        assert!(parse(r#"port "8025""#).is_err());
        assert!(parse(r#"protocol "json""#).is_err());
        assert!(parse("secure 1").is_err());
        assert!(parse("reconnect-interval-ms -5").is_err());
        assert!(parse(r#"host """#).is_err());
        assert!(parse("host").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = LookoutConfig::load(&temp.path().join("config.kdl")).unwrap();
        assert_eq!(config, LookoutConfig::default());
    }

    #[test]
    fn test_load_malformed_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.kdl");
        std::fs::write(&path, "port {{{").unwrap();
        match LookoutConfig::load(&path) {
            Err(Error::Config(msg)) => assert!(msg.contains("Failed to parse KDL")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
