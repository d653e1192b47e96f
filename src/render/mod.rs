//! Render adapters, one per resource kind.
//!
//! Adapters are terminal-independent view models. [`Adapters`] receives
//! snapshot notifications from [`SessionState`](crate::session::SessionState)
//! and routes each one to the single adapter owning that kind, so a
//! variables push never touches the threads view.

pub mod callstack;
pub mod card;
pub mod console;
pub mod diagram;
pub mod objects;
pub mod threads;
pub mod value;
pub mod variables;

pub use callstack::CallstackView;
pub use console::ConsoleView;
pub use diagram::DiagramView;
pub use objects::ObjectGraphView;
pub use threads::ThreadsView;
pub use variables::VariablesView;

use crate::protocol::{Payload, ResourceKind};
use crate::session::SnapshotSink;

/// Every adapter of one live session.
#[derive(Debug, Default)]
pub struct Adapters {
    pub threads: ThreadsView,
    pub callstack: CallstackView,
    pub variables: VariablesView,
    pub objects: ObjectGraphView,
    pub console: ConsoleView,
    pub diagram: DiagramView,
    /// Redraw count per kind, indexed by [`ResourceKind::index`]
    redraws: [u64; 6],
}

impl Adapters {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the adapter for `kind` has redrawn.
    pub fn redraws(&self, kind: ResourceKind) -> u64 {
        self.redraws[kind.index()]
    }

    /// Navigate the object graph to the card for `id`. Misses are no-ops.
    pub fn navigate_to(&mut self, id: &str) -> bool {
        self.objects.navigate_to(id)
    }
}

impl SnapshotSink for Adapters {
    fn snapshot_replaced(&mut self, kind: ResourceKind, snapshot: &Payload) {
        match snapshot {
            Payload::Threads(p) => self.threads.update(p),
            Payload::Callstack(p) => self.callstack.update(p),
            Payload::Variables(p) => self.variables.update(p),
            Payload::ObjectCards(p) => self.objects.update(p),
            Payload::ClassDiagram(p) => self.diagram.update(p),
            Payload::Console(_) => self.console.on_output(),
        }
        self.redraws[kind.index()] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;
    use crate::session::SessionState;

    #[test]
    fn test_only_matching_adapter_redraws() {
        let mut state = SessionState::new();
        let mut adapters = Adapters::new();
        let event = protocol::decode("variables:1=a,int,5,local;").unwrap();
        state.apply(event, &mut adapters);

        assert_eq!(adapters.redraws(ResourceKind::Variables), 1);
        for kind in ResourceKind::ALL {
            if kind != ResourceKind::Variables {
                assert_eq!(adapters.redraws(kind), 0, "{kind} redrew");
            }
        }
        assert_eq!(adapters.variables.rows.len(), 1);
    }

    #[test]
    fn test_variable_link_navigates_object_graph() {
        let mut state = SessionState::new();
        let mut adapters = Adapters::new();
        let cards = r#"{"type":"object_cards","payload":{"cards":[{"id":"5","svgBase64":"PHN2Zz48L3N2Zz4="},{"id":"7","svgBase64":"PHN2Zz48L3N2Zz4="}]}}"#;
        let vars = r#"{"type":"variables","payload":{"variables":[{"names":["head"],"pyType":"Node","value":{"kind":"composite","repr":"refid:7"},"scope":"local","id":"42"}]}}"#;
        state.apply(protocol::decode(cards).unwrap(), &mut adapters);
        state.apply(protocol::decode(vars).unwrap(), &mut adapters);

        let target = adapters.variables.link_target(0, 0).unwrap();
        assert_eq!(target, "7");
        assert!(adapters.navigate_to(&target));
        assert_eq!(adapters.objects.navigator.current_index(), 1);
        assert_eq!(adapters.objects.navigator.viewport_offset(), 100);
    }
}
