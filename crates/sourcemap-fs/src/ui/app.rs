//! Application loop for the TUI.

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};

use crate::app::dataset::Store;
use crate::app::navigator::{EngineEvent, Navigator};
use crate::app::tool::{Action, Tool, ToolKind};
use crate::domain::model::Item;
use crate::infra::config::Config;
use crate::ui::components::cycle_bar::CycleBar;
use crate::ui::components::swimlane::{SwimlaneView, tool_columns};

/// Interactive explorer over one sourcemap directory.
pub struct UiApp {
    navigator: Navigator,
    tick: Duration,
    status: Option<StatusMessage>,
    dirty: bool,
    should_quit: bool,
}

impl UiApp {
    /// Discover the sourcemaps in `dir`. Loading happens while the UI runs.
    pub fn open(dir: &Path, config: Config) -> Result<Self> {
        let navigator = Navigator::open(dir, &config)?;
        Ok(Self {
            navigator,
            tick: config.render.tick(),
            status: None,
            dirty: true,
            should_quit: false,
        })
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            let now = Instant::now();
            let loading = self.navigator.pump_loader(now);
            self.absorb_events();
            self.expire_status();

            let due = self.navigator.poll_redraw(now);
            if due || std::mem::take(&mut self.dirty) {
                terminal.draw(|frame| self.render(frame))?;
            }

            if self.should_quit {
                break;
            }

            // Loading advances one file per iteration; input is still checked between files.
            let timeout = if loading { Duration::ZERO } else { self.tick };
            if event::poll(timeout)? {
                let ev = event::read()?;
                self.handle_event(ev);
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(size);

        let swimlane = self.navigator.swimlane();
        let columns = tool_columns(swimlane, layout[1]);
        CycleBar.render(frame, layout[0], self.navigator.cycles().edges(), &columns);
        SwimlaneView.render(frame, layout[1], swimlane, self.navigator.store());
        self.render_status(frame, layout[2]);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let line = if let Some(progress) = self.navigator.root().progress
            && self.navigator.is_loading()
        {
            Line::styled(
                format!(
                    "loading sourcemaps {}% ({}/{})",
                    progress.percent(),
                    progress.processed,
                    progress.total
                ),
                Style::default().fg(Color::Yellow),
            )
        } else if let Some(status) = &self.status {
            let style = match status.level {
                StatusLevel::Info => Style::default().fg(Color::Gray),
                StatusLevel::Success => Style::default().fg(Color::Green),
                StatusLevel::Error => Style::default().fg(Color::Red),
            };
            Line::styled(status.text.clone(), style)
        } else {
            let key = Style::default().fg(Color::Cyan);
            Line::from(vec![
                Span::styled("↑/↓", key),
                Span::raw(" move · "),
                Span::styled("→", key),
                Span::raw(" proceed · "),
                Span::styled("←", key),
                Span::raw(" back · "),
                Span::styled("↵", key),
                Span::raw(" search · "),
                Span::styled("q", key),
                Span::raw(" quit"),
            ])
            .style(Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn absorb_events(&mut self) {
        for event in self.navigator.drain_events() {
            match event {
                EngineEvent::LoadFailed { message, .. } => {
                    self.set_status(StatusLevel::Error, message);
                }
                EngineEvent::DatasetReady => {
                    let root = self.navigator.root();
                    let text = format!(
                        "loaded {} chunks, {} modules ({} failed)",
                        root.chunks.len(),
                        root.modules.len(),
                        self.navigator.failures()
                    );
                    drop(root);
                    self.set_status(StatusLevel::Success, text);
                }
                EngineEvent::ItemSelected(item) => {
                    let text = describe_item(self.navigator.store(), item);
                    self.set_status(StatusLevel::Info, text);
                }
                EngineEvent::Progress(_)
                | EngineEvent::ToolAppended(_)
                | EngineEvent::ToolRemoved(_) => {}
            }
        }
    }

    fn expire_status(&mut self) {
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
            self.dirty = true;
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Resize(..) => self.dirty = true,
            _ => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let focused = self.navigator.swimlane().focused();
        let capturing = focused.is_some_and(Tool::is_capturing_input);
        let searching = focused.is_some_and(|tool| tool.kind() == ToolKind::Symbols);

        if !capturing && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            self.should_quit = true;
            return;
        }
        if let Some(action) = action_for(key, capturing, searching) {
            self.navigator.dispatch(action, Instant::now());
        }
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
        self.dirty = true;
    }
}

/// Map a key press to a navigation action.
///
/// `capturing` means the focused tool is taking text input; `searching` means it is the symbol
/// browser, where enter opens the search box instead of proceeding.
pub fn action_for(key: KeyEvent, capturing: bool, searching: bool) -> Option<Action> {
    if capturing {
        return match key.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Esc => Some(Action::Escape),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                Some(Action::Input(ch))
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => Some(Action::Previous),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('s') => Some(Action::Next),
        KeyCode::Enter | KeyCode::Char('/') if searching => Some(Action::BeginInput),
        KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') => {
            Some(Action::Proceed)
        }
        KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => Some(Action::Cancel),
        _ => None,
    }
}

fn describe_item(store: &Store, item: Item) -> String {
    match item {
        Item::Chunk(id) => format!("chunk {}", store.chunk(id).name),
        Item::Module(id) => format!("module {}", store.module(id).path),
        Item::Symbol(symbol) => format!(
            "symbol {}:{}:{}",
            store.module(symbol.module).path,
            symbol.line + 1,
            symbol.column
        ),
    }
}

#[derive(Debug)]
struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusLevel {
    Info,
    Success,
    Error,
}
