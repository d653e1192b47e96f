//! Wire protocol between the live view and the debug bridge.
//!
//! The bridge exposes a single WebSocket endpoint at `/websockets/debug`.
//! Two wire generations are in circulation and both must be understood:
//!
//! ## Structured envelope (preferred)
//!
//! ```json
//! {"type": "variables", "payload": {"variables": [...]}}
//! {"type": "action", "payload": {"command": "step-over"}}
//! ```
//!
//! ## Legacy delimited frames
//!
//! ```text
//! variables:1=a,int,5,local;2=b,str,hi,local;
//! oc:7|iVBORw0KGgo...###8|PHN2Zz4...###
//! action:console-input:print("a:b")
//! ```
//!
//! Inbound frames are classified per message by shape ([`decode`]): the
//! structured parse is tried first and the delimited parse is the fallback.
//! Callers only ever see an [`Event`]; which generation produced it stays
//! inside this module. Outbound [`Action`]s are encoded for whichever
//! [`ProtocolGeneration`] is active ([`encode`]).

pub mod envelope;
pub mod legacy;

use serde::{Deserialize, Serialize};

// ============================================================================
// Resource kinds
// ============================================================================

/// Named category of debuggee state pushed by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Threads,
    Callstack,
    Variables,
    ObjectCards,
    ClassDiagram,
    Console,
}

impl ResourceKind {
    /// Every kind, in display order.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Threads,
        ResourceKind::Callstack,
        ResourceKind::Variables,
        ResourceKind::ObjectCards,
        ResourceKind::ClassDiagram,
        ResourceKind::Console,
    ];

    /// Position of the kind in [`ResourceKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            ResourceKind::Threads => 0,
            ResourceKind::Callstack => 1,
            ResourceKind::Variables => 2,
            ResourceKind::ObjectCards => 3,
            ResourceKind::ClassDiagram => 4,
            ResourceKind::Console => 5,
        }
    }

    /// Name used as the envelope `type` and in `get` requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Threads => "threads",
            ResourceKind::Callstack => "callstack",
            ResourceKind::Variables => "variables",
            ResourceKind::ObjectCards => "object_cards",
            ResourceKind::ClassDiagram => "class_diagram",
            ResourceKind::Console => "console",
        }
    }

    /// Parse the structured name of a kind.
    pub fn parse(s: &str) -> Option<Self> {
        ResourceKind::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Payloads (server → client)
// ============================================================================

/// Lifecycle state of a debuggee thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreadState {
    Running,
    Suspended,
    Waiting,
    Killed,
    /// Any state name this client does not know yet.
    Unknown,
}

/// Both wire formats read state names through [`ThreadState::parse`].
impl<'de> Deserialize<'de> for ThreadState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ThreadState::parse(&name))
    }
}

impl ThreadState {
    /// Parse a state name case-insensitively.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => ThreadState::Running,
            "SUSPENDED" => ThreadState::Suspended,
            "WAITING" => ThreadState::Waiting,
            "KILLED" => ThreadState::Killed,
            _ => ThreadState::Unknown,
        }
    }

    /// Human-readable label shown next to a thread name.
    pub fn label(&self) -> &'static str {
        match self {
            ThreadState::Running => "running",
            ThreadState::Suspended => "suspended",
            ThreadState::Waiting => "waiting",
            ThreadState::Killed => "killed",
            ThreadState::Unknown => "unknown",
        }
    }
}

/// One thread of the debuggee. `name` is the stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDescriptor {
    pub name: String,
    pub state: ThreadState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadsPayload {
    #[serde(default)]
    pub threads: Vec<ThreadDescriptor>,
}

/// Frame names of the selected thread, top of stack first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallstackPayload {
    #[serde(default)]
    pub frames: Vec<String>,
}

/// Whether a value is shown verbatim or may embed `refid:<id>` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Primitive,
    #[serde(alias = "ref")]
    Composite,
}

/// Display form of a variable's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueView {
    pub kind: ValueKind,
    #[serde(default)]
    pub repr: String,
}

impl ValueView {
    pub fn primitive(repr: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Primitive,
            repr: repr.into(),
        }
    }

    pub fn composite(repr: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Composite,
            repr: repr.into(),
        }
    }
}

/// One row of the variables table.
///
/// `names` holds every alias bound to the same value; `id` anchors the
/// value's object card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntry {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(rename = "pyType", default)]
    pub py_type: String,
    pub value: ValueView,
    #[serde(default)]
    pub scope: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariablesPayload {
    #[serde(default)]
    pub variables: Vec<VariableEntry>,
}

/// A rendered object as it travels on the wire: base64 of SVG markup or a PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub id: String,
    #[serde(rename = "svgBase64", default)]
    pub svg_base64: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCardsPayload {
    #[serde(default)]
    pub cards: Vec<CardEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramPayload {
    #[serde(rename = "svgBase64", default)]
    pub svg_base64: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolePayload {
    #[serde(default)]
    pub text: String,
}

/// Full snapshot for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Threads(ThreadsPayload),
    Callstack(CallstackPayload),
    Variables(VariablesPayload),
    ObjectCards(ObjectCardsPayload),
    ClassDiagram(DiagramPayload),
    Console(ConsolePayload),
}

impl Payload {
    /// The defined empty snapshot for a kind.
    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Threads => Payload::Threads(ThreadsPayload::default()),
            ResourceKind::Callstack => Payload::Callstack(CallstackPayload::default()),
            ResourceKind::Variables => Payload::Variables(VariablesPayload::default()),
            ResourceKind::ObjectCards => Payload::ObjectCards(ObjectCardsPayload::default()),
            ResourceKind::ClassDiagram => Payload::ClassDiagram(DiagramPayload::default()),
            ResourceKind::Console => Payload::Console(ConsolePayload::default()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Payload::Threads(_) => ResourceKind::Threads,
            Payload::Callstack(_) => ResourceKind::Callstack,
            Payload::Variables(_) => ResourceKind::Variables,
            Payload::ObjectCards(_) => ResourceKind::ObjectCards,
            Payload::ClassDiagram(_) => ResourceKind::ClassDiagram,
            Payload::Console(_) => ResourceKind::Console,
        }
    }
}

/// A decoded inbound frame: a full replacement snapshot for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: ResourceKind,
    pub payload: Payload,
}

impl Event {
    pub fn new(payload: Payload) -> Self {
        Self {
            kind: payload.kind(),
            payload,
        }
    }
}

// ============================================================================
// Actions (client → server)
// ============================================================================

/// Outbound user intent. Fire-and-forget: no reply is correlated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Get(ResourceKind),
    Resume,
    Pause,
    StepOver,
    StepInto,
    StepOut,
    ThreadSelected(String),
    ConsoleInput(String),
    /// Ask the bridge to open the external step visualizer.
    Navigate,
}

impl Action {
    /// Command name as used by `action` frames, or the envelope type otherwise.
    pub fn command(&self) -> &'static str {
        match self {
            Action::Get(_) => "get",
            Action::Resume => "resume",
            Action::Pause => "pause",
            Action::StepOver => "step-over",
            Action::StepInto => "step-into",
            Action::StepOut => "step-out",
            Action::ThreadSelected(_) => "thread-selected",
            Action::ConsoleInput(_) => "console-input",
            Action::Navigate => "navigate",
        }
    }

    /// Optional string argument carried by the action.
    pub fn argument(&self) -> Option<&str> {
        match self {
            Action::Get(kind) => Some(kind.as_str()),
            Action::ThreadSelected(name) => Some(name),
            Action::ConsoleInput(text) => Some(text),
            _ => None,
        }
    }

    /// Parse a control command name (`resume`, `step-over`, ...).
    pub fn control(command: &str) -> Option<Self> {
        match command {
            "resume" => Some(Action::Resume),
            "pause" => Some(Action::Pause),
            "step-over" => Some(Action::StepOver),
            "step-into" => Some(Action::StepInto),
            "step-out" => Some(Action::StepOut),
            _ => None,
        }
    }
}

/// Which wire generation outbound frames are encoded in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolGeneration {
    #[default]
    Structured,
    Legacy,
}

impl ProtocolGeneration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolGeneration::Structured => "structured",
            ProtocolGeneration::Legacy => "legacy",
        }
    }
}

// ============================================================================
// Codec entry points
// ============================================================================

/// Decode one raw frame into at most one [`Event`].
///
/// Never fails: frames that match neither generation are dropped with a
/// warning and `None` is returned.
pub fn decode(raw: &str) -> Option<Event> {
    decode_with_generation(raw).map(|(event, _)| event)
}

/// Like [`decode`], also reporting which generation the frame was in.
pub fn decode_with_generation(raw: &str) -> Option<(Event, ProtocolGeneration)> {
    match envelope::decode(raw) {
        envelope::Decoded::Event(event) => {
            tracing::debug!(kind = %event.kind, "decoded structured frame");
            return Some((event, ProtocolGeneration::Structured));
        }
        envelope::Decoded::Dropped => return None,
        envelope::Decoded::NotStructured => {}
    }

    match legacy::decode(raw) {
        Ok(event) => {
            tracing::debug!(kind = %event.kind, "decoded legacy frame");
            Some((event, ProtocolGeneration::Legacy))
        }
        Err(reason) => {
            tracing::warn!(%reason, frame = %preview(raw), "dropping undecodable frame");
            None
        }
    }
}

/// Encode an [`Action`] in the given generation.
pub fn encode(action: &Action, generation: ProtocolGeneration) -> String {
    match generation {
        ProtocolGeneration::Structured => envelope::encode_action(action),
        ProtocolGeneration::Legacy => legacy::encode_action(action),
    }
}

/// Decode an outbound frame of either generation back into an [`Action`].
pub fn parse_action(raw: &str) -> Option<Action> {
    envelope::parse_action(raw).or_else(|| legacy::parse_action(raw))
}

/// Shorten a frame for log output.
pub(crate) fn preview(raw: &str) -> String {
    const MAX: usize = 80;
    match raw.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_parse_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("oc"), None);
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_thread_state_parse_is_case_insensitive() {
        assert_eq!(ThreadState::parse("suspended"), ThreadState::Suspended);
        assert_eq!(ThreadState::parse(" RUNNING "), ThreadState::Running);
        assert_eq!(ThreadState::parse("zombie"), ThreadState::Unknown);
    }

    #[test]
    fn test_payload_empty_matches_kind() {
        for kind in ResourceKind::ALL {
            assert_eq!(Payload::empty(kind).kind(), kind);
        }
    }

    #[test]
    fn test_decode_prefers_structured() {
        let raw = r#"{"type":"console","payload":{"text":"variables:1=a,int,5,local;"}}"#;
        let (event, generation) = decode_with_generation(raw).unwrap();
        assert_eq!(generation, ProtocolGeneration::Structured);
        assert_eq!(
            event.payload,
            Payload::Console(ConsolePayload {
                text: "variables:1=a,int,5,local;".to_string()
            })
        );
    }

    #[test]
    fn test_decode_falls_back_to_legacy() {
        let (event, generation) = decode_with_generation("callstack:main;run;").unwrap();
        assert_eq!(generation, ProtocolGeneration::Legacy);
        assert_eq!(event.kind, ResourceKind::Callstack);
    }

    #[test]
    fn test_decode_malformed_frames_yield_nothing() {
        for raw in [
            "",
            "{",
            "{\"type\":",
            "garbage",
            "unknown:tag",
            r#"{"type":"bogus","payload":{}}"#,
            r#"{"type":"threads","payload":{"threads":"nope"}}"#,
            "Success: Image loaded successfully with ID 7",
        ] {
            assert_eq!(decode(raw), None, "frame {raw:?} should be dropped");
        }
    }

    #[test]
    fn test_thread_selected_roundtrip_in_both_generations() {
        let action = Action::ThreadSelected("Worker-1".to_string());
        for generation in [ProtocolGeneration::Structured, ProtocolGeneration::Legacy] {
            let frame = encode(&action, generation);
            match parse_action(&frame) {
                Some(Action::ThreadSelected(name)) => assert_eq!(name, "Worker-1"),
                other => panic!("unexpected {other:?} from {frame}"),
            }
        }
    }

    #[test]
    fn test_preview_truncates_long_frames() {
        let raw = "x".repeat(200);
        let shown = preview(&raw);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.len(), 83);
        assert_eq!(preview("short"), "short");
    }
}
