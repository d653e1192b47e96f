//! Session state: the last snapshot received for every resource kind.
//!
//! Snapshots are replaced whole, never patched. [`SessionState::apply`]
//! swaps in the new payload first and only then notifies the sink for that
//! one kind, so a listener never observes a half-applied update.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::protocol::{
    CallstackPayload, ConsolePayload, DiagramPayload, Event, ObjectCardsPayload, Payload,
    ResourceKind, ThreadsPayload, VariablesPayload,
};

/// Maximum number of console lines kept in the transcript
pub const MAX_CONSOLE_LINES: usize = 500;

/// Receives a kind's snapshot right after it has been replaced.
pub trait SnapshotSink {
    fn snapshot_replaced(&mut self, kind: ResourceKind, snapshot: &Payload);
}

/// Who produced a console transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOrigin {
    /// Output of the debuggee
    Program,
    /// Input typed by the user, echoed locally
    User,
    /// Connection lifecycle notes from the client itself
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub timestamp: DateTime<Utc>,
    pub origin: ConsoleOrigin,
    pub text: String,
}

impl ConsoleLine {
    pub fn display(&self) -> String {
        match self.origin {
            ConsoleOrigin::User => format!("> {}", self.text),
            ConsoleOrigin::Client => format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.text),
            ConsoleOrigin::Program => self.text.clone(),
        }
    }
}

static EMPTY_THREADS: ThreadsPayload = ThreadsPayload {
    threads: Vec::new(),
};
static EMPTY_CALLSTACK: CallstackPayload = CallstackPayload { frames: Vec::new() };
static EMPTY_VARIABLES: VariablesPayload = VariablesPayload {
    variables: Vec::new(),
};
static EMPTY_CARDS: ObjectCardsPayload = ObjectCardsPayload { cards: Vec::new() };
static EMPTY_DIAGRAM: DiagramPayload = DiagramPayload {
    svg_base64: String::new(),
};
static EMPTY_CONSOLE: ConsolePayload = ConsolePayload {
    text: String::new(),
};

pub struct SessionState {
    /// One slot per kind, indexed by [`ResourceKind::index`].
    snapshots: [Payload; 6],
    console_log: VecDeque<ConsoleLine>,
    applied: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Every kind starts with its defined empty snapshot.
    pub fn new() -> Self {
        Self {
            snapshots: ResourceKind::ALL.map(Payload::empty),
            console_log: VecDeque::new(),
            applied: 0,
        }
    }

    /// Replace the snapshot for `event.kind`, then notify `sink` for that kind only.
    ///
    /// Identical snapshots are applied and notified again; nothing is diffed.
    pub fn apply(&mut self, event: Event, sink: &mut impl SnapshotSink) {
        let kind = event.payload.kind();
        if let Payload::Console(console) = &event.payload {
            self.push_console(ConsoleOrigin::Program, &console.text);
        }
        self.snapshots[kind.index()] = event.payload;
        self.applied += 1;
        tracing::debug!(%kind, applied = self.applied, "snapshot replaced");
        sink.snapshot_replaced(kind, self.get(kind));
    }

    /// Last applied snapshot for `kind`, or its empty default.
    pub fn get(&self, kind: ResourceKind) -> &Payload {
        &self.snapshots[kind.index()]
    }

    /// Number of snapshots applied since the session started.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn threads(&self) -> &ThreadsPayload {
        match self.get(ResourceKind::Threads) {
            Payload::Threads(p) => p,
            _ => &EMPTY_THREADS,
        }
    }

    pub fn callstack(&self) -> &CallstackPayload {
        match self.get(ResourceKind::Callstack) {
            Payload::Callstack(p) => p,
            _ => &EMPTY_CALLSTACK,
        }
    }

    pub fn variables(&self) -> &VariablesPayload {
        match self.get(ResourceKind::Variables) {
            Payload::Variables(p) => p,
            _ => &EMPTY_VARIABLES,
        }
    }

    pub fn object_cards(&self) -> &ObjectCardsPayload {
        match self.get(ResourceKind::ObjectCards) {
            Payload::ObjectCards(p) => p,
            _ => &EMPTY_CARDS,
        }
    }

    pub fn class_diagram(&self) -> &DiagramPayload {
        match self.get(ResourceKind::ClassDiagram) {
            Payload::ClassDiagram(p) => p,
            _ => &EMPTY_DIAGRAM,
        }
    }

    pub fn console(&self) -> &ConsolePayload {
        match self.get(ResourceKind::Console) {
            Payload::Console(p) => p,
            _ => &EMPTY_CONSOLE,
        }
    }

    /// Console transcript, oldest first.
    pub fn console_log(&self) -> impl DoubleEndedIterator<Item = &ConsoleLine> + ExactSizeIterator {
        self.console_log.iter()
    }

    /// Append a line to the transcript without touching any snapshot.
    pub fn push_console(&mut self, origin: ConsoleOrigin, text: &str) {
        self.console_log.push_back(ConsoleLine {
            timestamp: Utc::now(),
            origin,
            text: text.to_string(),
        });
        while self.console_log.len() > MAX_CONSOLE_LINES {
            self.console_log.pop_front();
        }
    }
}
