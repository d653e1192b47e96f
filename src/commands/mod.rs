//! Command implementations for the Lookout CLI.
//!
//! Headless commands:
//! - `watch` - stream applied snapshots to stdout
//! - `send` - fire one action at the bridge
//! - `config` - inspect the resolved configuration

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::cli::SendCommands;
use crate::config::{ResolvedConfig, default_config_path};
use crate::dispatch::Dispatcher;
use crate::live::LiveSession;
use crate::protocol::{Action, Event, Payload, ResourceKind, envelope};
use crate::render::card::{self, CardBody};
use crate::session::SessionState;
use crate::transport::{self, TransportEvent};
use crate::{Error, Result};

/// How long `send` waits for the channel to open
pub const SEND_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// `wss` needs a TLS-enabled build.
pub fn check_tls_support(config: &ResolvedConfig) -> Result<()> {
    if config.secure.value && !cfg!(feature = "tls") {
        return Err(Error::Config(
            "secure connections need a build with the `tls` feature".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// watch
// ============================================================================

/// Outcome of a `watch` run.
#[derive(Debug, Clone, Serialize)]
pub struct WatchSummary {
    pub snapshots: u64,
    pub connections: u64,
}

/// Stream every applied snapshot to `out` until `count` snapshots were
/// printed, Ctrl-C is pressed, or the transport stops.
pub async fn watch(
    config: &ResolvedConfig,
    count: Option<u64>,
    human: bool,
    out: &mut impl Write,
) -> Result<WatchSummary> {
    check_tls_support(config)?;
    let mut summary = WatchSummary {
        snapshots: 0,
        connections: 0,
    };
    if count == Some(0) {
        return Ok(summary);
    }

    let endpoint = config.endpoint();
    let (mut handle, mut events, task) = transport::spawn(&endpoint, config.reconnect_interval());
    let mut live = LiveSession::new(config.protocol());
    tracing::info!(url = %endpoint.url(), protocol = %config.protocol(), "watching");

    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(event) = event else {
            break;
        };
        let Some(kind) = live.on_transport_event(event, &mut handle) else {
            continue;
        };

        let line = if human {
            summarize(&live.state, kind)
        } else {
            envelope::encode_event(&Event::new(live.state.get(kind).clone()))
        };
        writeln!(out, "{}", line)?;
        out.flush()?;

        summary.snapshots += 1;
        if count.is_some_and(|n| summary.snapshots >= n) {
            break;
        }
    }

    summary.connections = live.connections();
    handle.close();
    drop(events);
    let _ = task.await;
    Ok(summary)
}

/// One-line description of the current snapshot for `kind`.
pub fn summarize(state: &SessionState, kind: ResourceKind) -> String {
    match state.get(kind) {
        Payload::Threads(p) => {
            let threads: Vec<String> = p
                .threads
                .iter()
                .map(|t| format!("{} ({})", t.name, t.state.label()))
                .collect();
            format!("threads: {}", threads.join(", "))
        }
        Payload::Callstack(p) => match p.frames.first() {
            Some(top) => format!("callstack: {} frames, top {}", p.frames.len(), top),
            None => "callstack: empty".to_string(),
        },
        Payload::Variables(p) => {
            let names: Vec<String> = p.variables.iter().map(|v| v.names.join("/")).collect();
            format!(
                "variables: {} entries [{}]",
                p.variables.len(),
                names.join(", ")
            )
        }
        Payload::ObjectCards(p) => {
            let ids: Vec<&str> = p.cards.iter().map(|c| c.id.as_str()).collect();
            format!("object_cards: {} cards [{}]", p.cards.len(), ids.join(", "))
        }
        Payload::ClassDiagram(p) => match card::render_card("class_diagram", &p.svg_base64).body {
            CardBody::Png { width, height } => format!("class_diagram: png {}x{}", width, height),
            CardBody::Svg(doc) => format!("class_diagram: svg, {} labels", doc.text.len()),
            CardBody::Unavailable(reason) => format!("class_diagram: unavailable ({})", reason),
        },
        Payload::Console(p) => format!("console: {}", p.text.trim_end()),
    }
}

// ============================================================================
// send
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub url: String,
    pub command: String,
    pub frame: String,
}

impl Output for SendResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        format!("Sent {} to {}", self.command, self.url)
    }
}

impl TryFrom<&SendCommands> for Action {
    type Error = Error;

    fn try_from(command: &SendCommands) -> Result<Self> {
        Ok(match command {
            SendCommands::Resume => Action::Resume,
            SendCommands::Pause => Action::Pause,
            SendCommands::StepOver => Action::StepOver,
            SendCommands::StepInto => Action::StepInto,
            SendCommands::StepOut => Action::StepOut,
            SendCommands::ThreadSelected { name } => Action::ThreadSelected(name.clone()),
            SendCommands::ConsoleInput { text } => Action::ConsoleInput(text.clone()),
            SendCommands::Navigate => Action::Navigate,
            SendCommands::Get { resource } => {
                let kind = ResourceKind::parse(resource).ok_or_else(|| {
                    Error::InvalidInput(format!("unknown resource `{}`", resource))
                })?;
                Action::Get(kind)
            }
        })
    }
}

/// Connect, send `action` once, close. Fails if the channel does not open.
pub async fn send(config: &ResolvedConfig, action: &Action) -> Result<SendResult> {
    check_tls_support(config)?;
    let endpoint = config.endpoint();
    let url = endpoint.url();
    let (mut handle, mut events, task) = transport::spawn(&endpoint, config.reconnect_interval());
    let mut dispatcher = Dispatcher::new(config.protocol());

    let opened = tokio::time::timeout(SEND_CONNECT_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Open => return Ok(()),
                TransportEvent::Error(reason) => return Err(reason),
                TransportEvent::Message(_) | TransportEvent::Closed => {}
            }
        }
        Err("transport stopped".to_string())
    })
    .await;

    let result = match opened {
        Ok(Ok(())) => {
            dispatcher.dispatch(action, &mut handle);
            Ok(SendResult {
                url: url.clone(),
                command: action.command().to_string(),
                frame: crate::protocol::encode(action, dispatcher.generation()),
            })
        }
        Ok(Err(reason)) => Err(Error::Transport(format!(
            "could not connect to {}: {}",
            url, reason
        ))),
        Err(_) => Err(Error::Transport(format!(
            "timed out connecting to {}",
            url
        ))),
    };

    handle.close();
    drop(events);
    let _ = task.await;
    result
}

// ============================================================================
// config
// ============================================================================

impl Output for ResolvedConfig {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("host = {} ({})", self.host.value, self.host.source),
            format!("port = {} ({})", self.port.value, self.port.source),
            format!("secure = {} ({})", self.secure.value, self.secure.source),
            format!("protocol = {} ({})", self.protocol.value, self.protocol.source),
            format!(
                "reconnect-interval-ms = {} ({})",
                self.reconnect_interval_ms.value, self.reconnect_interval_ms.source
            ),
        ];
        match &self.log_file {
            Some(log) => lines.push(format!("log-file = {} ({})", log.value.display(), log.source)),
            None => lines.push("log-file = (default)".to_string()),
        }
        lines.push(format!("url = {}", self.endpoint().url()));
        lines.join("\n")
    }
}

/// `config show`
pub fn config_show(config: &ResolvedConfig) -> ResolvedConfig {
    config.clone()
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigPathResult {
    pub path: Option<PathBuf>,
    pub exists: bool,
}

impl Output for ConfigPathResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        match &self.path {
            Some(path) if self.exists => path.display().to_string(),
            Some(path) => format!("{} (not created yet)", path.display()),
            None => "No config directory available".to_string(),
        }
    }
}

/// `config path`
pub fn config_path(config: &ResolvedConfig) -> ConfigPathResult {
    let path = config.config_path.clone().or_else(default_config_path);
    let exists = path.as_deref().is_some_and(|p| p.exists());
    ConfigPathResult { path, exists }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, LookoutConfig, resolve_with};

    fn defaults() -> ResolvedConfig {
        resolve_with(&LookoutConfig::default(), None, &ConfigOverrides::new())
    }

    #[test]
    fn test_send_command_to_action() {
        let get = SendCommands::Get {
            resource: "object_cards".to_string(),
        };
        assert_eq!(
            Action::try_from(&get).unwrap(),
            Action::Get(ResourceKind::ObjectCards)
        );
        let bad = SendCommands::Get {
            resource: "oc".to_string(),
        };
        assert!(matches!(Action::try_from(&bad), Err(Error::InvalidInput(_))));
        assert_eq!(
            Action::try_from(&SendCommands::StepOut).unwrap(),
            Action::StepOut
        );
    }

    #[test]
    fn test_summarize_variables() {
        let mut state = SessionState::new();
        let mut sink = crate::render::Adapters::new();
        state.apply(
            crate::protocol::decode("variables:1=a###b,int,5,local;2=c,str,hi,local;").unwrap(),
            &mut sink,
        );
        assert_eq!(
            summarize(&state, ResourceKind::Variables),
            "variables: 2 entries [a/b, c]"
        );
        assert_eq!(summarize(&state, ResourceKind::Callstack), "callstack: empty");
    }

    #[test]
    fn test_config_show_human() {
        let human = config_show(&defaults()).to_human();
        assert!(human.contains("host = localhost (default)"));
        assert!(human.contains("url = ws://localhost:8025/websockets/debug"));
    }

    #[test]
    fn test_config_show_json() {
        let json: serde_json::Value =
            serde_json::from_str(&config_show(&defaults()).to_json()).unwrap();
        assert_eq!(json["host"]["value"], "localhost");
        assert_eq!(json["reconnect_interval_ms"]["value"], 5000);
    }

    #[test]
    fn test_secure_without_tls_feature() {
        let mut config = defaults();
        config.secure.value = true;
        assert_eq!(check_tls_support(&config).is_ok(), cfg!(feature = "tls"));
    }

    #[tokio::test]
    async fn test_watch_zero_count_returns_immediately() {
        let mut out = Vec::new();
        let summary = watch(&defaults(), Some(0), false, &mut out).await.unwrap();
        assert_eq!(summary.snapshots, 0);
        assert!(out.is_empty());
    }
}
