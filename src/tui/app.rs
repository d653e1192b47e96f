//! TUI Application - main event loop and terminal management
//!
//! This module contains the core TUI application logic including:
//! - Terminal setup and restoration
//! - Key handling, mapped onto live-session intents
//! - Event loop over keyboard input and transport events
//! - View switching between the live panels and the class diagram

use std::io::{self, stdout};
use std::time::Duration;

use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::views::{
    render_callstack, render_card_panel, render_console, render_diagram, render_threads,
    render_variables,
};
use crate::config::ResolvedConfig;
use crate::live::{Intent, LiveSession, Outcome};
use crate::navigator::Direction as Slide;
use crate::transport::{self, ConnectionState, FrameSink};

/// Active view in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Live,
    Diagram,
}

/// Panel with keyboard focus in the live view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Threads,
    Callstack,
    Variables,
    Objects,
    Console,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Threads => Focus::Callstack,
            Focus::Callstack => Focus::Variables,
            Focus::Variables => Focus::Objects,
            Focus::Objects => Focus::Console,
            Focus::Console => Focus::Threads,
        }
    }
}

/// TUI Application state
pub struct TuiApp {
    live: LiveSession,
    /// Last connection state seen from the transport
    connection_state: ConnectionState,
    active_view: ActiveView,
    focus: Focus,
    /// Whether to quit the application
    should_quit: bool,
}

impl TuiApp {
    pub fn new(live: LiveSession) -> Self {
        Self {
            live,
            connection_state: ConnectionState::Connecting { attempt: 1 },
            active_view: ActiveView::Live,
            focus: Focus::Threads,
            should_quit: false,
        }
    }

    fn intent(&mut self, intent: Intent, sink: &mut impl FrameSink) {
        if self.live.handle(intent, sink) == Outcome::Closed {
            self.should_quit = true;
        }
    }

    /// Handle one key press.
    fn handle_key(&mut self, key: KeyCode, sink: &mut impl FrameSink) {
        if self.live.adapters.console.editing {
            self.handle_console_key(key, sink);
            return;
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Char('1') => self.active_view = ActiveView::Live,
            KeyCode::Char('2') => {
                self.active_view = ActiveView::Diagram;
                self.intent(Intent::ShowDiagram, sink);
            }
            KeyCode::Char(':') => {
                self.focus = Focus::Console;
                self.live.adapters.console.editing = true;
            }
            KeyCode::Char('r') => self.intent(Intent::Resume, sink),
            KeyCode::Char('p') => self.intent(Intent::Pause, sink),
            KeyCode::Char('n') => self.intent(Intent::StepOver, sink),
            KeyCode::Char('s') => self.intent(Intent::StepInto, sink),
            KeyCode::Char('u') => self.intent(Intent::StepOut, sink),
            KeyCode::Char('g') => self.intent(Intent::Refresh, sink),
            KeyCode::Char('t') => self.intent(Intent::NavigateAway, sink),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(false),
            KeyCode::Char('l') | KeyCode::Right => self.move_sideways(Slide::Forward),
            KeyCode::Char('h') | KeyCode::Left => self.move_sideways(Slide::Backward),
            KeyCode::Enter => self.activate(sink),
            _ => {}
        }
    }

    fn handle_console_key(&mut self, key: KeyCode, sink: &mut impl FrameSink) {
        let console = &mut self.live.adapters.console;
        match key {
            KeyCode::Esc => console.editing = false,
            KeyCode::Backspace => console.backspace(),
            KeyCode::Char(c) => console.push_char(c),
            KeyCode::Enter => {
                if let Some(text) = console.submit() {
                    self.intent(Intent::SubmitConsole(text), sink);
                }
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let adapters = &mut self.live.adapters;
        match (self.focus, down) {
            (Focus::Threads, true) => adapters.threads.select_next(),
            (Focus::Threads, false) => adapters.threads.select_previous(),
            (Focus::Variables, true) => adapters.variables.select_next(),
            (Focus::Variables, false) => adapters.variables.select_previous(),
            (Focus::Objects, _) => adapters.objects.focus_next_link(),
            _ => {}
        }
    }

    fn move_sideways(&mut self, direction: Slide) {
        let adapters = &mut self.live.adapters;
        match (self.focus, direction) {
            (Focus::Variables, Slide::Forward) => adapters.variables.focus_next_link(),
            (Focus::Variables, Slide::Backward) => adapters.variables.focus_previous_link(),
            (Focus::Objects, direction) => adapters.objects.move_slide(direction),
            _ => {}
        }
    }

    fn activate(&mut self, sink: &mut impl FrameSink) {
        match self.focus {
            Focus::Threads => self.intent(Intent::ChooseThread, sink),
            Focus::Variables => {
                self.intent(Intent::ActivateVariable, sink);
                self.focus = Focus::Objects;
            }
            Focus::Objects => self.intent(Intent::FollowCardLink, sink),
            Focus::Console => self.live.adapters.console.editing = true,
            Focus::Callstack => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Min(5),    // Main content
                Constraint::Length(3), // Status bar
            ])
            .split(frame.area());

        self.render_title_bar(frame, chunks[0]);
        match self.active_view {
            ActiveView::Live => self.render_live(frame, chunks[1]),
            ActiveView::Diagram => render_diagram(frame, chunks[1], &self.live.adapters.diagram),
        }
        self.render_status_bar(frame, chunks[2]);
    }

    fn render_live(&self, frame: &mut Frame, area: Rect) {
        let adapters = &self.live.adapters;
        let [top, console] =
            Layout::vertical([Constraint::Percentage(75), Constraint::Percentage(25)]).areas(area);
        let [left, middle, right] = Layout::horizontal([
            Constraint::Percentage(20),
            Constraint::Percentage(45),
            Constraint::Percentage(35),
        ])
        .areas(top);
        let [threads, callstack] =
            Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(left);

        render_threads(frame, threads, &adapters.threads, self.focus == Focus::Threads);
        render_callstack(frame, callstack, &adapters.callstack, self.focus == Focus::Callstack);
        render_variables(frame, middle, &adapters.variables, self.focus == Focus::Variables);
        render_card_panel(frame, right, &adapters.objects, self.focus == Focus::Objects);
        render_console(
            frame,
            console,
            &adapters.console,
            &self.live.state,
            self.focus == Focus::Console,
        );
    }

    /// Render the title bar with connection status
    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let (status_indicator, status_color) = match &self.connection_state {
            ConnectionState::Open => ("●", Color::Green),
            ConnectionState::Connecting { .. } => ("○", Color::Yellow),
            ConnectionState::Closed { .. } => ("✗", Color::Red),
        };

        let (view_name, view_hint) = match self.active_view {
            ActiveView::Live => (" [1] Live", "[2] Diagram"),
            ActiveView::Diagram => ("[1] Live", " [2] Diagram"),
        };

        let title_text = format!("{} | {}", view_name, view_hint);
        let status_display = format!(
            "[{}] {}",
            status_indicator,
            self.connection_state.label()
        );
        let padding = area
            .width
            .saturating_sub(title_text.len() as u16 + status_display.len() as u16 + 4);

        let view_style = Style::default().add_modifier(Modifier::BOLD);
        let inactive_style = Style::default().fg(Color::DarkGray);
        let (left_style, right_style) = match self.active_view {
            ActiveView::Live => (view_style, inactive_style),
            ActiveView::Diagram => (inactive_style, view_style),
        };

        let title = Paragraph::new(Line::from(vec![
            Span::styled(format!(" {}", view_name), left_style),
            Span::raw(" | "),
            Span::styled(view_hint, right_style),
            Span::raw(" ".repeat(padding as usize)),
            Span::styled(status_display, Style::default().fg(status_color)),
        ]))
        .block(Block::default().borders(Borders::ALL));

        frame.render_widget(title, area);
    }

    /// Render the status bar with keybindings
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let text = if self.live.adapters.console.editing {
            " Enter:Send  Esc:Leave input"
        } else {
            " Tab:Focus  1/2:View  j/k:Move  h/l:Link/Slide  Enter:Open  r/p:Resume/Pause  n/s/u:Step  g:Refresh  ::Input  t:Visualizer  q:Quit"
        };
        let status = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, area);
    }
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to normal mode
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the TUI application against the configured bridge.
///
/// The transport keeps reconnecting in the background, so the view opens
/// even when the bridge is not up yet.
pub async fn run_tui(config: &ResolvedConfig) -> crate::Result<()> {
    let endpoint = config.endpoint();
    let (mut handle, mut events, task) = transport::spawn(&endpoint, config.reconnect_interval());
    let mut app = TuiApp::new(LiveSession::new(config.protocol()));
    tracing::info!(url = %endpoint.url(), protocol = %config.protocol(), "starting live view");

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &mut handle, &mut events).await;
    restore_terminal()?;

    handle.close();
    drop(events);
    let _ = task.await;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
    handle: &mut transport::TransportHandle,
    events: &mut tokio::sync::mpsc::UnboundedReceiver<transport::TransportEvent>,
) -> crate::Result<()> {
    loop {
        app.connection_state = handle.state();
        terminal.draw(|f| app.render(f))?;

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind == KeyEventKind::Press {
                            app.handle_key(key.code, handle);
                        }
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Some(event) => {
                        app.live.on_transport_event(event, handle);
                    }
                    None => app.should_quit = true,
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
