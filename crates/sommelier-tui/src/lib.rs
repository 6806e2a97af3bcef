// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use sommelier_app::{
    AiConsultResult, Category, ConsultTask, ConsultTicket, Coordinator, CredentialStore,
    PairingItem, SEARCH_PLACEHOLDER, ViewCommand, ViewEvent, ViewMode, ViewState,
    validate_credential,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const SELECTED_MARK: &str = "▸";
const AI_BADGE: &str = "✦ AI";
const KEY_MASK: char = '•';

/// Host services the terminal UI needs but does not own.
pub trait AppRuntime {
    fn credentials(&mut self) -> &mut dyn CredentialStore;

    fn has_credential(&mut self) -> bool {
        self.credentials().has_credential()
    }

    fn consult(&mut self, query: &str) -> AiConsultResult;

    /// Runs the consult and reports back over `tx`. Runtimes with a real
    /// network client override this to run on a worker thread.
    fn spawn_consult(&mut self, ticket: ConsultTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.consult(&ticket.query);
        tx.send(InternalEvent::ConsultFinished {
            request_id: ticket.request_id,
            result,
        })
        .map_err(|_| anyhow::anyhow!("consult event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    ConsultFinished { request_id: u64, result: AiConsultResult },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct KeyPromptState {
    input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    selected: usize,
    key_prompt: Option<KeyPromptState>,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(coordinator: &mut Coordinator<'_>, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if !runtime.has_credential() {
        view_data.key_prompt = Some(KeyPromptState::default());
    }

    let mut result = Ok(());
    loop {
        process_internal_events(coordinator, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, coordinator, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(coordinator, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    coordinator: &mut Coordinator<'_>,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                coordinator.dispatch(ViewCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::ConsultFinished { request_id, result } => {
                let events =
                    coordinator.dispatch(ViewCommand::ConsultFinished { request_id, result });
                absorb_events(view_data, tx, &events);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

/// Bookkeeping the UI does in response to coordinator events. Consult
/// tickets are handled by the caller since they need the runtime.
fn absorb_events(view_data: &mut ViewData, tx: &Sender<InternalEvent>, events: &[ViewEvent]) {
    for event in events {
        match event {
            ViewEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            ViewEvent::ResultsUpdated(_) | ViewEvent::ModeChanged(_) => {
                view_data.selected = 0;
            }
            ViewEvent::ConsultStarted(_)
            | ViewEvent::ConsultSettled(_)
            | ViewEvent::StatusCleared => {}
        }
    }
}

fn dispatch<R: AppRuntime>(
    coordinator: &mut Coordinator<'_>,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: ViewCommand,
) {
    let events = coordinator.dispatch(command);
    absorb_events(view_data, tx, &events);

    for event in events {
        let ViewEvent::ConsultStarted(ticket) = event else {
            continue;
        };
        let request_id = ticket.request_id;
        if let Err(error) = runtime.spawn_consult(ticket, tx.clone()) {
            tracing::warn!(request_id, error = %error, "consult could not be started");
            let events = coordinator.dispatch(ViewCommand::ConsultFinished {
                request_id,
                result: AiConsultResult::Degraded,
            });
            absorb_events(view_data, tx, &events);
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    coordinator: &mut Coordinator<'_>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if key.code == KeyCode::Char('c') && ctrl {
        return true;
    }

    if view_data.key_prompt.is_some() {
        handle_key_prompt_key(coordinator, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
            view_data.help_visible = false;
        }
        return false;
    }

    let command = match key.code {
        KeyCode::Char('a') if ctrl => Some(ViewCommand::RequestConsult),
        KeyCode::Char('k') if ctrl => {
            view_data.key_prompt = Some(KeyPromptState::default());
            None
        }
        KeyCode::F(1) => {
            view_data.help_visible = true;
            None
        }
        KeyCode::Tab => Some(ViewCommand::CategorySelected(
            coordinator.view().category.rotate(1),
        )),
        KeyCode::BackTab => Some(ViewCommand::CategorySelected(
            coordinator.view().category.rotate(-1),
        )),
        KeyCode::Esc => Some(ViewCommand::Back),
        KeyCode::Up => {
            view_data.selected = view_data.selected.saturating_sub(1);
            None
        }
        KeyCode::Down => {
            let last = coordinator.view().results.len().saturating_sub(1);
            view_data.selected = (view_data.selected + 1).min(last);
            None
        }
        KeyCode::Backspace => {
            let mut query = coordinator.view().query.clone();
            query.pop().map(|_| ViewCommand::QueryChanged(query))
        }
        KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            let mut query = coordinator.view().query.clone();
            query.push(ch);
            Some(ViewCommand::QueryChanged(query))
        }
        _ => None,
    };

    if let Some(command) = command {
        dispatch(coordinator, runtime, view_data, internal_tx, command);
    }
    false
}

fn handle_key_prompt_key<R: AppRuntime>(
    coordinator: &mut Coordinator<'_>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(prompt) = view_data.key_prompt.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => {
            view_data.key_prompt = None;
        }
        KeyCode::Enter => {
            let input = std::mem::take(&mut prompt.input);
            let rejected = validate_credential(&input).is_err();
            let events = coordinator.save_credential(runtime.credentials(), &input);
            if !rejected {
                view_data.key_prompt = None;
            }
            absorb_events(view_data, internal_tx, &events);
        }
        KeyCode::Backspace => {
            prompt.input.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.input.push(ch);
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame<'_>, coordinator: &Coordinator<'_>, view_data: &ViewData) {
    let view = coordinator.view();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let search = if view.query.is_empty() {
        Paragraph::new(SEARCH_PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(view.query.as_str()).style(Style::default().fg(Color::White))
    };
    frame.render_widget(
        search.block(Block::default().title("sommelier").borders(Borders::ALL)),
        layout[0],
    );

    let selected = Category::ALL
        .iter()
        .position(|category| *category == view.category)
        .unwrap_or(0);
    let tabs = Tabs::new(Category::ALL.iter().map(|category| category.label()))
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[1]);

    let body_block = Block::default()
        .borders(Borders::ALL)
        .title(view.mode.label());
    let body = match coordinator.browse_view() {
        Some(browse) => Paragraph::new(browse.to_text()),
        None if view.results.is_empty() => Paragraph::new(render_empty_text(view)),
        None => Paragraph::new(result_lines(view, view_data.selected)),
    };
    frame.render_widget(body.block(body_block).wrap(Wrap { trim: false }), layout[2]);

    let status = Paragraph::new(status_text(view))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if let Some(prompt) = &view_data.key_prompt {
        let area = centered_rect(60, 24, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_key_prompt_text(prompt)).block(
            Block::default()
                .title("API key")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn result_lines(view: &ViewState, selected: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, item) in view.results.iter().enumerate() {
        let is_selected = index == selected;
        let name_style = if is_selected {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let mut header = vec![
            Span::raw(if is_selected {
                format!("{SELECTED_MARK} ")
            } else {
                "  ".to_owned()
            }),
            Span::styled(item.name().to_owned(), name_style),
        ];
        for tag in card_tags(item) {
            let style = if tag == AI_BADGE {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            header.push(Span::raw(" "));
            header.push(Span::styled(format!("[{tag}]"), style));
        }
        lines.push(Line::from(header));
        lines.push(Line::from(format!(
            "    pairs with: {}",
            item.matches().join(", ")
        )));
        if !item.description().is_empty() {
            lines.push(Line::from(format!("    {}", item.description())));
        }
        lines.push(Line::from(""));
    }
    lines
}

fn card_tags(item: &PairingItem) -> Vec<String> {
    let mut tags = Vec::new();
    if item.is_ai_generated() {
        tags.push(AI_BADGE.to_owned());
    }
    tags.push(item.tag_label().to_owned());
    if let Some(course) = item.course() {
        tags.push(course.label().to_owned());
    }
    tags
}

fn render_empty_text(view: &ViewState) -> String {
    let mut out = format!("No pairings found for \"{}\".", view.query.trim());
    match view.consult {
        ConsultTask::Pending { .. } => out.push_str("\n\nThe AI sommelier is thinking..."),
        _ if view.can_consult() => {
            out.push_str("\n\nPress ctrl-a to ask the AI sommelier for suggestions.");
        }
        _ => {}
    }
    if let ConsultTask::Failed(failure) = view.consult {
        out.push_str(&format!("\n{}", failure.guidance()));
    }
    out
}

fn render_key_prompt_text(prompt: &KeyPromptState) -> String {
    let masked: String = prompt.input.chars().map(|_| KEY_MASK).collect();
    format!(
        "Paste the API key for the AI sommelier.\n\n> {masked}\n\nenter save | esc cancel"
    )
}

fn status_text(view: &ViewState) -> String {
    if let Some(status) = &view.status_line {
        return status.clone();
    }
    let mode = match view.mode {
        ViewMode::Browse => "EXPLORE",
        ViewMode::Filtered => "SEARCH",
        ViewMode::AiAugmented => "AI",
    };
    let mut hints = format!("{mode} | type to search | tab category | esc back");
    if view.can_consult() {
        hints.push_str(" | ctrl-a ask AI");
    }
    hints.push_str(" | ctrl-k key | F1 help | ctrl-c quit");
    hints
}

fn help_overlay_text() -> &'static str {
    "search: type to filter | backspace delete | esc clear search and category\n\
category: tab next | shift+tab previous\n\
results: up/down move selection\n\
ai: ctrl+a ask when nothing matches | ctrl+k set API key\n\
global: F1 help | ctrl+c quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AI_BADGE, AppRuntime, InternalEvent, KeyPromptState, ViewData, card_tags,
        handle_key_event, process_internal_events, render_empty_text, render_key_prompt_text,
        result_lines, status_text,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use sommelier_app::{
        AiConsultResult, AiSuggestion, Catalog, Category, ConsultFailure, ConsultTask,
        ConsultTicket, Coordinator, CredentialStore, PairingItem, PairingKind, ViewMode,
    };
    use sommelier_testkit::{MemoryCredentialStore, PairingFaker, steak_and_merlot};
    use std::sync::mpsc::{self, Receiver, Sender};

    #[derive(Debug, Default)]
    struct TestRuntime {
        credentials: MemoryCredentialStore,
        reply: Option<AiConsultResult>,
        consulted: Vec<String>,
        fail_spawn: bool,
    }

    impl TestRuntime {
        fn with_key() -> Self {
            Self {
                credentials: MemoryCredentialStore::with_key("abc123"),
                ..Self::default()
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn credentials(&mut self) -> &mut dyn CredentialStore {
            &mut self.credentials
        }

        fn consult(&mut self, query: &str) -> AiConsultResult {
            self.consulted.push(query.to_owned());
            if !self.credentials.has_credential() {
                return AiConsultResult::CredentialMissing;
            }
            self.reply.clone().unwrap_or(AiConsultResult::Degraded)
        }

        fn spawn_consult(
            &mut self,
            ticket: ConsultTicket,
            tx: Sender<InternalEvent>,
        ) -> anyhow::Result<()> {
            if self.fail_spawn {
                anyhow::bail!("worker pool exhausted");
            }
            let result = self.consult(&ticket.query);
            tx.send(InternalEvent::ConsultFinished {
                request_id: ticket.request_id,
                result,
            })?;
            Ok(())
        }
    }

    fn channel() -> (Sender<InternalEvent>, Receiver<InternalEvent>) {
        mpsc::channel()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(
        coordinator: &mut Coordinator<'_>,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        text: &str,
    ) {
        for ch in text.chars() {
            handle_key_event(coordinator, runtime, view_data, tx, key(KeyCode::Char(ch)));
        }
    }

    fn pinot_for_duck() -> AiConsultResult {
        AiConsultResult::Suggestions(vec![PairingItem::AiGenerated(AiSuggestion {
            name: "Pinot Noir".to_owned(),
            kind: PairingKind::Wine,
            matches: vec!["duck".to_owned()],
            description: "Bright cherry fruit.".to_owned(),
        })])
    }

    #[test]
    fn typing_filters_and_backspace_returns_to_browse() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::with_key();
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();

        type_text(&mut coordinator, &mut runtime, &mut view_data, &tx, "st");
        assert_eq!(coordinator.view().mode, ViewMode::Filtered);
        assert_eq!(coordinator.view().results.len(), 1);

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Backspace),
        );
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Backspace),
        );
        assert_eq!(coordinator.view().mode, ViewMode::Browse);
        assert!(coordinator.browse_view().is_some());
    }

    #[test]
    fn tab_cycles_category_and_esc_resets() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::with_key();
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Tab),
        );
        assert_eq!(coordinator.view().category, Category::Wine);
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::BackTab),
        );
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::BackTab),
        );
        assert_eq!(coordinator.view().category, Category::Dessert);

        type_text(&mut coordinator, &mut runtime, &mut view_data, &tx, "x");
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Esc),
        );
        assert_eq!(coordinator.view().category, Category::All);
        assert_eq!(coordinator.view().query, "");
        assert_eq!(coordinator.view().mode, ViewMode::Browse);
    }

    #[test]
    fn ctrl_a_consults_and_settles_into_ai_results() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime {
            reply: Some(pinot_for_duck()),
            ..TestRuntime::with_key()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        type_text(&mut coordinator, &mut runtime, &mut view_data, &tx, "duck");
        assert!(coordinator.view().can_consult());
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('a'),
        );
        assert!(coordinator.view().consult_in_flight());
        assert_eq!(runtime.consulted, vec!["duck".to_owned()]);

        process_internal_events(&mut coordinator, &mut view_data, &tx, &rx);
        assert_eq!(coordinator.view().mode, ViewMode::AiAugmented);
        assert_eq!(coordinator.view().consult, ConsultTask::Succeeded { count: 1 });
        assert!(coordinator.view().results[0].is_ai_generated());
    }

    #[test]
    fn ctrl_a_is_refused_while_results_exist() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::with_key();
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();

        type_text(&mut coordinator, &mut runtime, &mut view_data, &tx, "steak");
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('a'),
        );
        assert!(runtime.consulted.is_empty());
        assert_eq!(coordinator.view().consult, ConsultTask::Idle);
    }

    #[test]
    fn missing_key_failure_shows_guidance() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        type_text(&mut coordinator, &mut runtime, &mut view_data, &tx, "duck");
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('a'),
        );
        process_internal_events(&mut coordinator, &mut view_data, &tx, &rx);

        assert_eq!(
            coordinator.view().consult,
            ConsultTask::Failed(ConsultFailure::CredentialMissing)
        );
        assert!(render_empty_text(coordinator.view()).contains("ctrl-k"));
    }

    #[test]
    fn spawn_failure_settles_as_degraded() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime {
            fail_spawn: true,
            ..TestRuntime::with_key()
        };
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();

        type_text(&mut coordinator, &mut runtime, &mut view_data, &tx, "duck");
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('a'),
        );
        assert_eq!(
            coordinator.view().consult,
            ConsultTask::Failed(ConsultFailure::Degraded)
        );
        assert!(!coordinator.view().consult_in_flight());
    }

    #[test]
    fn key_prompt_masks_input_and_saves_on_enter() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('k'),
        );
        assert!(view_data.key_prompt.is_some());
        type_text(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            "abc123",
        );
        assert_eq!(coordinator.view().query, "");

        let prompt = view_data.key_prompt.clone().expect("prompt should be open");
        let rendered = render_key_prompt_text(&prompt);
        assert!(!rendered.contains("abc123"));
        assert!(rendered.contains("••••••"));

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Enter),
        );
        assert!(view_data.key_prompt.is_none());
        assert!(runtime.has_credential());
        assert_eq!(coordinator.view().status_line.as_deref(), Some("API key saved"));
    }

    #[test]
    fn empty_key_keeps_prompt_open() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData {
            key_prompt: Some(KeyPromptState::default()),
            ..ViewData::default()
        };
        let (tx, _rx) = channel();

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Enter),
        );
        assert!(view_data.key_prompt.is_some());
        assert!(!runtime.has_credential());
        assert!(
            coordinator
                .view()
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("must not be empty"))
        );

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Esc),
        );
        assert!(view_data.key_prompt.is_none());
    }

    #[test]
    fn storage_failure_surfaces_cause_and_leaves_no_key() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime {
            credentials: MemoryCredentialStore::failing(),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('k'),
        );
        type_text(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            "abc123",
        );
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Enter),
        );

        assert_eq!(runtime.credentials.save_attempts, 1);
        assert!(!runtime.has_credential());
        assert_eq!(
            coordinator.view().status_line.as_deref(),
            Some("save API key: disk is read-only")
        );
    }

    #[test]
    fn stale_clear_status_token_is_ignored() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        type_text(&mut coordinator, &mut runtime, &mut view_data, &tx, "duck");
        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('a'),
        );
        let token = view_data.status_token;
        assert!(token > 0);

        tx.send(InternalEvent::ClearStatus { token: token - 1 })
            .expect("send clear");
        process_internal_events(&mut coordinator, &mut view_data, &tx, &rx);
        assert!(coordinator.view().status_line.is_some());

        tx.send(InternalEvent::ClearStatus {
            token: view_data.status_token,
        })
        .expect("send clear");
        process_internal_events(&mut coordinator, &mut view_data, &tx, &rx);
        assert!(coordinator.view().status_line.is_none());
    }

    #[test]
    fn selection_moves_within_results_and_resets_on_change() {
        let mut faker = PairingFaker::new(11);
        let catalog: Catalog = faker.catalog(30, 0);
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Tab),
        );
        let count = coordinator.view().results.len();
        for _ in 0..count + 3 {
            handle_key_event(
                &mut coordinator,
                &mut runtime,
                &mut view_data,
                &tx,
                key(KeyCode::Down),
            );
        }
        assert_eq!(view_data.selected, count.saturating_sub(1));

        handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Tab),
        );
        assert_eq!(view_data.selected, 0);
    }

    #[test]
    fn result_cards_carry_badges_and_tags() {
        let ai = PairingItem::AiGenerated(AiSuggestion {
            name: "Pinot Noir".to_owned(),
            kind: PairingKind::Wine,
            matches: vec!["duck".to_owned()],
            description: String::new(),
        });
        assert_eq!(card_tags(&ai), vec![AI_BADGE.to_owned(), "Wine".to_owned()]);

        let catalog = Catalog::load().expect("bundled catalog loads");
        let restaurant_dish = catalog
            .items()
            .iter()
            .find(|item| item.restaurant().is_some())
            .expect("bundled catalog has restaurant dishes");
        let tags = card_tags(restaurant_dish);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], restaurant_dish.restaurant().unwrap_or_default());
    }

    #[test]
    fn result_lines_mark_the_selected_card() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        coordinator.dispatch(sommelier_app::ViewCommand::QueryChanged("e".to_owned()));

        let lines = result_lines(coordinator.view(), 1);
        let text: Vec<String> = lines.iter().map(ToString::to_string).collect();
        assert!(text[0].starts_with("  Steak"));
        assert!(text.iter().any(|line| line.starts_with("▸ Merlot")));
        assert!(text.iter().any(|line| line.contains("pairs with: Merlot, Cabernet")));
    }

    #[test]
    fn status_hints_offer_consult_only_when_possible() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        assert!(!status_text(coordinator.view()).contains("ctrl-a"));

        coordinator.dispatch(sommelier_app::ViewCommand::QueryChanged("duck".to_owned()));
        assert!(status_text(coordinator.view()).contains("ctrl-a"));
        assert!(render_empty_text(coordinator.view()).contains("No pairings found"));

        coordinator.dispatch(sommelier_app::ViewCommand::RequestConsult);
        assert!(render_empty_text(coordinator.view()).contains("thinking"));
    }

    #[test]
    fn ctrl_c_quits_even_with_prompt_open() {
        let catalog = steak_and_merlot();
        let mut coordinator = Coordinator::new(&catalog);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData {
            key_prompt: Some(KeyPromptState::default()),
            ..ViewData::default()
        };
        let (tx, _rx) = channel();
        assert!(handle_key_event(
            &mut coordinator,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('c'),
        ));
    }
}
