//! Structured `{type, payload}` envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    Action, CallstackPayload, ConsolePayload, DiagramPayload, Event, ObjectCardsPayload, Payload,
    ResourceKind, ThreadsPayload, VariablesPayload, preview,
};

/// Outcome of the structured parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(Event),
    /// Frame was meant to be structured but is unusable; it has been logged.
    Dropped,
    /// Frame is not an envelope at all; try the legacy format.
    NotStructured,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    payload: Value,
}

/// Messages sent from the live view to the bridge.
///
/// ```json
/// {"type": "get", "payload": {"resource": "variables"}}
/// {"type": "action", "payload": {"command": "resume"}}
/// {"type": "thread_selected", "payload": {"name": "Worker-1"}}
/// {"type": "console_input", "payload": {"text": "42"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    Get { resource: String },
    Action { command: String },
    ThreadSelected { name: String },
    ConsoleInput { text: String },
    Navigate {},
}

impl From<&Action> for ClientMessage {
    fn from(action: &Action) -> Self {
        match action {
            Action::Get(kind) => ClientMessage::Get {
                resource: kind.as_str().to_string(),
            },
            Action::ThreadSelected(name) => ClientMessage::ThreadSelected { name: name.clone() },
            Action::ConsoleInput(text) => ClientMessage::ConsoleInput { text: text.clone() },
            Action::Navigate => ClientMessage::Navigate {},
            control => ClientMessage::Action {
                command: control.command().to_string(),
            },
        }
    }
}

/// Try to read `raw` as an envelope.
pub fn decode(raw: &str) -> Decoded {
    if !raw.trim_start().starts_with('{') {
        return Decoded::NotStructured;
    }

    let envelope: RawEnvelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, frame = %preview(raw), "dropping malformed structured frame");
            return Decoded::Dropped;
        }
    };

    let Some(kind) = inbound_kind(&envelope.message_type) else {
        tracing::warn!(message_type = %envelope.message_type, "dropping frame of unknown type");
        return Decoded::Dropped;
    };

    match payload_from_value(kind, envelope.payload) {
        Ok(payload) => Decoded::Event(Event::new(payload)),
        Err(e) => {
            tracing::warn!(%kind, error = %e, "dropping frame with malformed payload");
            Decoded::Dropped
        }
    }
}

/// The object diagram shares the diagram view with the class diagram.
const OBJECT_DIAGRAM: &str = "object_diagram";

fn inbound_kind(message_type: &str) -> Option<ResourceKind> {
    if message_type == OBJECT_DIAGRAM {
        return Some(ResourceKind::ClassDiagram);
    }
    ResourceKind::parse(message_type)
}

fn payload_from_value(kind: ResourceKind, value: Value) -> serde_json::Result<Payload> {
    // A bare `{"type": "threads"}` is an empty snapshot.
    let value = match value {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    Ok(match kind {
        ResourceKind::Threads => Payload::Threads(serde_json::from_value::<ThreadsPayload>(value)?),
        ResourceKind::Callstack => {
            Payload::Callstack(serde_json::from_value::<CallstackPayload>(value)?)
        }
        ResourceKind::Variables => {
            Payload::Variables(serde_json::from_value::<VariablesPayload>(value)?)
        }
        ResourceKind::ObjectCards => {
            Payload::ObjectCards(serde_json::from_value::<ObjectCardsPayload>(value)?)
        }
        ResourceKind::ClassDiagram => {
            Payload::ClassDiagram(serde_json::from_value::<DiagramPayload>(value)?)
        }
        ResourceKind::Console => Payload::Console(serde_json::from_value::<ConsolePayload>(value)?),
    })
}

#[derive(Serialize)]
struct EventEnvelope<'a> {
    #[serde(rename = "type")]
    message_type: &'a str,
    payload: &'a Payload,
}

/// Serialize a snapshot back into envelope form.
pub fn encode_event(event: &Event) -> String {
    let envelope = EventEnvelope {
        message_type: event.kind.as_str(),
        payload: &event.payload,
    };
    serde_json::to_string(&envelope).unwrap_or_default()
}

pub fn encode_action(action: &Action) -> String {
    serde_json::to_string(&ClientMessage::from(action)).unwrap_or_default()
}

/// Read an outbound envelope back into an [`Action`].
pub fn parse_action(raw: &str) -> Option<Action> {
    match serde_json::from_str::<ClientMessage>(raw).ok()? {
        ClientMessage::Get { resource } => ResourceKind::parse(&resource).map(Action::Get),
        ClientMessage::Action { command } => Action::control(&command),
        ClientMessage::ThreadSelected { name } => Some(Action::ThreadSelected(name)),
        ClientMessage::ConsoleInput { text } => Some(Action::ConsoleInput(text)),
        ClientMessage::Navigate {} => Some(Action::Navigate),
    }
}
