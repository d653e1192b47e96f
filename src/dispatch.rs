//! Action Dispatcher: user intents to outbound frames.
//!
//! Every action becomes exactly one encoded frame handed to the transport.
//! Nothing is acknowledged or correlated; the bridge answers, if at all, by
//! pushing a fresh snapshot.

use serde::{Deserialize, Serialize};

use crate::protocol::{self, Action, ProtocolGeneration, ResourceKind};
use crate::transport::FrameSink;

/// Resources requested every time the channel opens, in request order.
pub const BASELINE: [ResourceKind; 4] = [
    ResourceKind::Variables,
    ResourceKind::ObjectCards,
    ResourceKind::Callstack,
    ResourceKind::Threads,
];

/// Which generation outbound frames use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolPolicy {
    /// Always the JSON envelope
    #[default]
    Structured,
    /// Always the delimited `tag:data` form
    Legacy,
    /// Mirror the generation of the last inbound frame
    Follow,
}

impl ProtocolPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "structured" => Some(ProtocolPolicy::Structured),
            "legacy" => Some(ProtocolPolicy::Legacy),
            "follow" => Some(ProtocolPolicy::Follow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolPolicy::Structured => "structured",
            ProtocolPolicy::Legacy => "legacy",
            ProtocolPolicy::Follow => "follow",
        }
    }
}

impl std::fmt::Display for ProtocolPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    policy: ProtocolPolicy,
    active: ProtocolGeneration,
    sent: u64,
}

impl Dispatcher {
    pub fn new(policy: ProtocolPolicy) -> Self {
        let active = match policy {
            ProtocolPolicy::Legacy => ProtocolGeneration::Legacy,
            ProtocolPolicy::Structured | ProtocolPolicy::Follow => ProtocolGeneration::Structured,
        };
        Self {
            policy,
            active,
            sent: 0,
        }
    }

    pub fn policy(&self) -> ProtocolPolicy {
        self.policy
    }

    /// Generation the next frame will be encoded in.
    pub fn generation(&self) -> ProtocolGeneration {
        self.active
    }

    /// Note the generation of an inbound frame.
    pub fn observe_inbound(&mut self, generation: ProtocolGeneration) {
        if self.policy == ProtocolPolicy::Follow && self.active != generation {
            tracing::info!(generation = generation.as_str(), "following server protocol");
            self.active = generation;
        }
    }

    /// Encode `action` and hand it to `sink`.
    pub fn dispatch(&mut self, action: &Action, sink: &mut impl FrameSink) {
        let raw = protocol::encode(action, self.active);
        tracing::debug!(command = action.command(), frame = %protocol::preview(&raw), "dispatching");
        sink.send_frame(raw);
        self.sent += 1;
    }

    /// Issue one `get` per baseline resource.
    pub fn request_baseline(&mut self, sink: &mut impl FrameSink) {
        for kind in BASELINE {
            self.dispatch(&Action::Get(kind), sink);
        }
    }

    /// Number of frames handed to the transport.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<String>,
    }

    impl FrameSink for Recorder {
        fn send_frame(&mut self, raw: String) {
            self.frames.push(raw);
        }
    }

    #[test]
    fn test_each_intent_sends_exactly_one_frame() {
        let mut dispatcher = Dispatcher::new(ProtocolPolicy::Legacy);
        let mut sink = Recorder::default();
        let actions = [
            Action::Resume,
            Action::Pause,
            Action::StepOver,
            Action::StepInto,
            Action::StepOut,
            Action::ThreadSelected("Worker-1".to_string()),
            Action::ConsoleInput("print(1)".to_string()),
            Action::Get(ResourceKind::Threads),
        ];
        for action in &actions {
            dispatcher.dispatch(action, &mut sink);
        }
        assert_eq!(
            sink.frames,
            vec![
                "action:resume",
                "action:pause",
                "action:step-over",
                "action:step-into",
                "action:step-out",
                "action:thread-selected:Worker-1",
                "action:console-input:print(1)",
                "get:threads",
            ]
        );
        assert_eq!(dispatcher.sent(), actions.len() as u64);
    }

    #[test]
    fn test_baseline_order() {
        let mut dispatcher = Dispatcher::new(ProtocolPolicy::Legacy);
        let mut sink = Recorder::default();
        dispatcher.request_baseline(&mut sink);
        assert_eq!(
            sink.frames,
            vec!["get:variables", "get:oc", "get:callstack", "get:threads"]
        );
    }

    #[test]
    fn test_structured_baseline() {
        let mut dispatcher = Dispatcher::new(ProtocolPolicy::Structured);
        let mut sink = Recorder::default();
        dispatcher.request_baseline(&mut sink);
        let kinds: Vec<Action> = sink
            .frames
            .iter()
            .filter_map(|f| protocol::parse_action(f))
            .collect();
        assert_eq!(kinds, BASELINE.map(Action::Get).to_vec());
        assert!(sink.frames.iter().all(|f| f.starts_with('{')));
    }

    #[test]
    fn test_follow_policy_mirrors_inbound() {
        let mut dispatcher = Dispatcher::new(ProtocolPolicy::Follow);
        assert_eq!(dispatcher.generation(), ProtocolGeneration::Structured);
        dispatcher.observe_inbound(ProtocolGeneration::Legacy);
        assert_eq!(dispatcher.generation(), ProtocolGeneration::Legacy);

        let mut fixed = Dispatcher::new(ProtocolPolicy::Structured);
        fixed.observe_inbound(ProtocolGeneration::Legacy);
        assert_eq!(fixed.generation(), ProtocolGeneration::Structured);
    }

    #[test]
    fn test_policy_parse() {
        for policy in [
            ProtocolPolicy::Structured,
            ProtocolPolicy::Legacy,
            ProtocolPolicy::Follow,
        ] {
            assert_eq!(ProtocolPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(ProtocolPolicy::parse("json"), None);
    }
}
