//! One live session: transport events in, adapters updated, intents out.
//!
//! ```text
//! TransportEvent -> decode -> SessionState::apply -> Adapters
//! Intent -> Dispatcher -> encode -> FrameSink
//! ```
//!
//! All of it runs on the caller's task, one event at a time, so applying a
//! snapshot always finishes before the next event is looked at.

use crate::dispatch::{Dispatcher, ProtocolPolicy};
use crate::navigator::Direction;
use crate::protocol::{self, Action, ResourceKind};
use crate::render::Adapters;
use crate::session::{ConsoleOrigin, SessionState};
use crate::transport::{FrameSink, TransportEvent};

/// A discrete user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Resume,
    Pause,
    StepOver,
    StepInto,
    StepOut,
    /// Select the thread under the cursor in the threads view
    ChooseThread,
    /// Submit console input
    SubmitConsole(String),
    /// Activate the highlighted variable row (or its focused link)
    ActivateVariable,
    /// Follow the focused link on the current object card
    FollowCardLink,
    /// Step through the object cards
    MoveSlide(Direction),
    /// Request the class diagram
    ShowDiagram,
    /// Request the baseline again
    Refresh,
    /// Hand over to the external step visualizer and close the channel
    NavigateAway,
}

/// What the caller should do after an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// The channel was closed on purpose
    Closed,
}

pub struct LiveSession {
    pub state: SessionState,
    pub adapters: Adapters,
    pub dispatcher: Dispatcher,
    /// Number of times the channel has opened
    connections: u64,
}

impl LiveSession {
    pub fn new(policy: ProtocolPolicy) -> Self {
        Self {
            state: SessionState::new(),
            adapters: Adapters::new(),
            dispatcher: Dispatcher::new(policy),
            connections: 0,
        }
    }

    pub fn connections(&self) -> u64 {
        self.connections
    }

    /// React to one transport notification. Returns the kind whose snapshot
    /// was replaced, if any.
    pub fn on_transport_event(
        &mut self,
        event: TransportEvent,
        sink: &mut impl FrameSink,
    ) -> Option<ResourceKind> {
        match event {
            TransportEvent::Open => {
                self.connections += 1;
                self.state.push_console(ConsoleOrigin::Client, "connected");
                self.dispatcher.request_baseline(sink);
                None
            }
            TransportEvent::Message(raw) => self.on_frame(&raw),
            TransportEvent::Closed => {
                self.state
                    .push_console(ConsoleOrigin::Client, "connection lost, reconnecting");
                None
            }
            TransportEvent::Error(reason) => {
                tracing::debug!(%reason, "transport error");
                None
            }
        }
    }

    /// Decode and apply one inbound frame.
    pub fn on_frame(&mut self, raw: &str) -> Option<ResourceKind> {
        let (event, generation) = protocol::decode_with_generation(raw)?;
        self.dispatcher.observe_inbound(generation);
        let kind = event.kind;
        self.state.apply(event, &mut self.adapters);
        Some(kind)
    }

    pub fn handle(&mut self, intent: Intent, sink: &mut impl FrameSink) -> Outcome {
        match intent {
            Intent::Resume => self.dispatcher.dispatch(&Action::Resume, sink),
            Intent::Pause => self.dispatcher.dispatch(&Action::Pause, sink),
            Intent::StepOver => self.dispatcher.dispatch(&Action::StepOver, sink),
            Intent::StepInto => self.dispatcher.dispatch(&Action::StepInto, sink),
            Intent::StepOut => self.dispatcher.dispatch(&Action::StepOut, sink),
            Intent::ChooseThread => {
                if let Some(name) = self.adapters.threads.choose() {
                    self.dispatcher
                        .dispatch(&Action::ThreadSelected(name), sink);
                }
            }
            Intent::SubmitConsole(text) => {
                self.state.push_console(ConsoleOrigin::User, &text);
                self.dispatcher.dispatch(&Action::ConsoleInput(text), sink);
            }
            Intent::ActivateVariable => {
                if let Some(id) = self.adapters.variables.activate() {
                    self.adapters.navigate_to(&id);
                }
            }
            Intent::FollowCardLink => {
                self.adapters.objects.follow_link();
            }
            Intent::MoveSlide(direction) => self.adapters.objects.move_slide(direction),
            Intent::ShowDiagram => self
                .dispatcher
                .dispatch(&Action::Get(ResourceKind::ClassDiagram), sink),
            Intent::Refresh => self.dispatcher.request_baseline(sink),
            Intent::NavigateAway => {
                self.dispatcher.dispatch(&Action::Navigate, sink);
                sink.close();
                return Outcome::Closed;
            }
        }
        Outcome::Continue
    }
}
