use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyCode, KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use tracing::debug;
use tracing::info;

use finboard_core::selector::resolve_panel;
use finboard_core::selector::tool_cards;
use finboard_core::selector::ToolCard;
use finboard_core::tool_registry::ToolRegistry;
use finboard_core::{
    ChatRole, Config, DashAction, DashEffect, DashFocus, DashOverlay, DashState, LogLevel,
    RuntimeAction, ToolPhase, UserAction,
};
use finboard_exec::{AgentEvent, AgentSession, SimulatedToolExecutor};

use crate::driver::Driver;
use crate::palette::{palette_for, UiPalette};
use crate::render::{render_panel, RenderOptions};

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste,
            crossterm::cursor::Show
        );
    }
}

pub fn run(state: DashState, config: &Config, log_path: Option<&Path>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste,
        crossterm::cursor::Hide
    )?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut driver = Driver::new(state);
    if let Some(path) = log_path {
        driver.dispatch(DashAction::Runtime(RuntimeAction::AppendLog(format!(
            "logging to {}",
            path.display()
        ))));
    }
    let executor = SimulatedToolExecutor::new(config.agent.seed);
    info!(seed = executor.seed(), "simulated tool executor ready");
    let session = AgentSession::new(
        executor,
        Duration::from_millis(config.agent.phase_delay_ms),
    );
    run_app(&mut terminal, &mut driver, session)
}

/// Agent output tagged with the dashboard session that asked for it.
struct UiEvent {
    session_id: u64,
    event: AgentEvent,
}

enum KeyHandlerResult {
    Continue(Vec<DashEffect>),
    Exit,
}

fn user(driver: &mut Driver, action: UserAction) -> Vec<DashEffect> {
    driver.dispatch(DashAction::User(action))
}

fn suggestion_index(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::F(n @ 1..=4) => Some(usize::from(n) - 1),
        _ => None,
    }
}

fn handle_help_keys(key: event::KeyEvent, driver: &mut Driver) -> KeyHandlerResult {
    let effects = match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            user(driver, UserAction::CloseOverlay)
        }
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_chat_focus_keys(key: event::KeyEvent, driver: &mut Driver) -> KeyHandlerResult {
    if let Some(index) = suggestion_index(key.code) {
        return KeyHandlerResult::Continue(user(driver, UserAction::UseSuggestion(index)));
    }
    let effects = match key.code {
        KeyCode::Tab => user(driver, UserAction::ToggleFocus),
        KeyCode::Esc => user(driver, UserAction::FollowLatest),
        KeyCode::Enter => user(driver, UserAction::SubmitChat),
        KeyCode::Backspace => user(driver, UserAction::ChatBackspace),
        KeyCode::Left => user(driver, UserAction::SelectPrevCard),
        KeyCode::Right => user(driver, UserAction::SelectNextCard),
        KeyCode::Char(c) => user(driver, UserAction::ChatInput(c)),
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_card_focus_keys(key: event::KeyEvent, driver: &mut Driver) -> KeyHandlerResult {
    if let Some(index) = suggestion_index(key.code) {
        return KeyHandlerResult::Continue(user(driver, UserAction::UseSuggestion(index)));
    }
    let effects = match key.code {
        KeyCode::Tab | KeyCode::Enter | KeyCode::Char('i') => user(driver, UserAction::ToggleFocus),
        KeyCode::Left | KeyCode::Char('h') => user(driver, UserAction::SelectPrevCard),
        KeyCode::Right | KeyCode::Char('l') => user(driver, UserAction::SelectNextCard),
        KeyCode::Esc => user(driver, UserAction::FollowLatest),
        KeyCode::Char('r') => user(driver, UserAction::ToggleRawPayload),
        KeyCode::Char('y') => user(driver, UserAction::CopyPayload),
        KeyCode::Char('t') => user(driver, UserAction::CycleTheme),
        KeyCode::Char('a') => user(driver, UserAction::ToggleActivity),
        KeyCode::Char('n') => user(driver, UserAction::NewSession),
        KeyCode::Char('?') => user(driver, UserAction::ToggleHelp),
        KeyCode::Char('q') => user(driver, UserAction::Quit),
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_key_event(key: event::KeyEvent, driver: &mut Driver) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }

    match driver.state.interaction.overlay {
        DashOverlay::Help => handle_help_keys(key, driver),
        DashOverlay::None => match driver.state.interaction.focus {
            DashFocus::Chat => handle_chat_focus_keys(key, driver),
            DashFocus::Cards => handle_card_focus_keys(key, driver),
        },
    }
}

fn handle_mouse_event(
    mouse: event::MouseEvent,
    driver: &mut Driver,
    area: Rect,
) -> Vec<DashEffect> {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left)
        || driver.state.interaction.overlay != DashOverlay::None
    {
        return Vec::new();
    }
    let layout = DashLayout::compute(area, &driver.state);
    if contains(layout.cards, mouse.column, mouse.row) {
        let cards = tool_cards(driver.state.results.committed());
        if let Some(name) = card_at(&cards, layout.cards, mouse.column) {
            return user(driver, UserAction::SelectTool { name });
        }
        return Vec::new();
    }
    let clicked_chat = contains(layout.chat, mouse.column, mouse.row)
        || contains(layout.input, mouse.column, mouse.row);
    let wants_toggle = match driver.state.interaction.focus {
        DashFocus::Chat => !clicked_chat && contains(layout.panel, mouse.column, mouse.row),
        DashFocus::Cards => clicked_chat,
    };
    if wants_toggle {
        return user(driver, UserAction::ToggleFocus);
    }
    Vec::new()
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    driver: &mut Driver,
    mut session: AgentSession,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel::<UiEvent>();
    let mut dirty = true;

    loop {
        let mut effects = driver.begin_turn();

        while let Ok(UiEvent { session_id, event }) = rx.try_recv() {
            if session_id != driver.state.header.session_id {
                debug!(session_id, "dropping agent event from a previous session");
                continue;
            }
            effects.extend(driver.dispatch(DashAction::Runtime(event.into_action())));
            dirty = true;
        }

        if dirty || is_animating(&driver.state) {
            terminal.draw(|f| ui(f, &driver.state))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => match handle_key_event(key, driver) {
                    KeyHandlerResult::Continue(e) => effects.extend(e),
                    KeyHandlerResult::Exit => return Ok(()),
                },
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let area = Rect::new(0, 0, size.width, size.height);
                    effects.extend(handle_mouse_event(mouse, driver, area));
                }
                Event::Paste(text) if driver.state.interaction.focus == DashFocus::Chat => {
                    effects.extend(user(driver, UserAction::ChatPaste(text)));
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        for effect in effects {
            match effect {
                DashEffect::RequestFrame => dirty = true,
                DashEffect::ScheduleFlush => {}
                DashEffect::SubmitPrompt { prompt, tenant_id } => {
                    let tx_clone = tx.clone();
                    let session_id = driver.state.header.session_id;
                    info!(session_id, tenant = %tenant_id, "submitting prompt");
                    session.spawn_turn(prompt, tenant_id, move |event| {
                        let _ = tx_clone.send(UiEvent { session_id, event });
                    });
                }
                DashEffect::CopyToClipboard(text) => {
                    let outcome = copy_to_clipboard(text);
                    driver.dispatch(DashAction::Runtime(RuntimeAction::ClipboardCopied(outcome)));
                    dirty = true;
                }
                DashEffect::NewSession { session_id } => {
                    debug!(session_id, "agent events from earlier sessions will be ignored");
                }
                DashEffect::Quit => return Ok(()),
            }
        }
    }
}

fn copy_to_clipboard(text: String) -> Result<(), String> {
    arboard::Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text))
        .map_err(|err| err.to_string())
}

fn is_animating(state: &DashState) -> bool {
    state.interaction.agent_busy
        || state
            .results
            .committed()
            .records()
            .values()
            .any(|record| record.is_in_progress())
}

fn get_spinner() -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    frames[(millis / 100) as usize % frames.len()]
}

struct DashLayout {
    header: Rect,
    cards: Rect,
    panel: Rect,
    chat: Rect,
    input: Rect,
    activity: Option<Rect>,
    footer: Rect,
}

impl DashLayout {
    fn compute(area: Rect, state: &DashState) -> Self {
        let show_activity = state.customization.show_activity;
        let mut constraints = vec![
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tool cards
            Constraint::Min(0),    // Panel + chat
            Constraint::Length(3), // Input
        ];
        if show_activity {
            constraints.push(Constraint::Length(7));
        }
        constraints.push(Constraint::Length(1)); // Footer

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(constraints)
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[2]);

        Self {
            header: chunks[0],
            cards: chunks[1],
            panel: columns[0],
            chat: columns[1],
            input: chunks[3],
            activity: show_activity.then(|| chunks[4]),
            footer: chunks[chunks.len() - 1],
        }
    }
}

fn ui(f: &mut ratatui::Frame, state: &DashState) {
    let palette = palette_for(state.customization.theme);
    let layout = DashLayout::compute(f.area(), state);
    let spinner = get_spinner();

    // Header
    let agent = if state.interaction.agent_busy {
        format!("{spinner} answering")
    } else {
        "idle".to_string()
    };
    let header_text = format!(
        "FinOps Agent | Tenant:{} | Session:{} | Theme:{} | {}",
        state.header.tenant_id,
        state.header.session_id,
        state.customization.theme.label(),
        agent
    );
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(palette.accent))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(header, layout.header);

    render_cards(f, layout.cards, state, palette, spinner);

    // Main panel
    let focus_border = |focused: bool| {
        if focused {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.border)
        }
    };
    let options = RenderOptions {
        palette,
        theme: state.customization.theme,
        tenant_id: &state.header.tenant_id,
        raw_payload: state.interaction.raw_payload,
        spinner,
    };
    let snapshot = state.results.committed();
    let (title, lines) = render_panel(resolve_panel(snapshot), options);
    let pinned = snapshot.selected().is_some();
    let panel_title = if pinned {
        format!("{title} [pinned]")
    } else {
        title
    };
    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().bg(palette.panel_bg))
                .border_style(focus_border(state.interaction.focus == DashFocus::Cards))
                .title(panel_title),
        );
    f.render_widget(panel, layout.panel);

    render_chat(f, layout.chat, state, palette);

    // Input
    let input_text = if state.interaction.chat_input.is_empty()
        && state.interaction.focus == DashFocus::Chat
    {
        Line::from(Span::styled(
            "Ask about transactions, SLA or payment channels",
            Style::default().fg(palette.muted),
        ))
    } else {
        Line::from(state.interaction.chat_input.clone())
    };
    let input = Paragraph::new(input_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_border(state.interaction.focus == DashFocus::Chat))
            .title("Prompt"),
    );
    f.render_widget(input, layout.input);
    if state.interaction.focus == DashFocus::Chat
        && state.interaction.overlay == DashOverlay::None
    {
        let offset =
            u16::try_from(state.interaction.chat_input.chars().count()).unwrap_or(u16::MAX);
        let x = layout.input.x.saturating_add(1).saturating_add(offset);
        f.set_cursor_position((
            x.min(layout.input.right().saturating_sub(2)),
            layout.input.y + 1,
        ));
    }

    if let Some(area) = layout.activity {
        render_activity(f, area, state, palette);
    }

    render_footer(f, layout.footer, state, palette);

    if state.interaction.overlay == DashOverlay::Help {
        render_help(f, palette);
    }
}

fn card_spans(card: &ToolCard, palette: UiPalette, spinner: &str) -> Vec<Span<'static>> {
    let glyph = match card.phase {
        ToolPhase::Pending => "○".to_string(),
        ToolPhase::Running => spinner.to_string(),
        ToolPhase::Complete => "●".to_string(),
    };
    let mut style = Style::default().fg(palette.phase(card.phase));
    if card.active {
        style = style.bg(palette.selected_bg).add_modifier(Modifier::BOLD);
    }
    let pin = if card.pinned { "*" } else { "" };
    vec![
        Span::styled(format!(" {glyph} {}{pin} ", card.label), style),
        Span::raw(" "),
    ]
}

/// Cards are laid out left to right inside the block border.
fn card_at(cards: &[ToolCard], area: Rect, column: u16) -> Option<String> {
    let palette = palette_for(finboard_core::UiTheme::Classic);
    let mut x = area.x.saturating_add(1);
    for card in cards {
        let width: u16 = card_spans(card, palette, "⠋")
            .iter()
            .map(|span| u16::try_from(span.width()).unwrap_or(u16::MAX))
            .sum();
        if column >= x && column < x.saturating_add(width) {
            return Some(card.tool_name.clone());
        }
        x = x.saturating_add(width);
    }
    None
}

fn render_cards(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DashState,
    palette: UiPalette,
    spinner: &str,
) {
    let cards = tool_cards(state.results.committed());
    let line = if cards.is_empty() {
        Line::from(Span::styled("No tool calls yet", Style::default().fg(palette.muted)))
    } else {
        Line::from(
            cards
                .iter()
                .flat_map(|card| card_spans(card, palette, spinner))
                .collect::<Vec<_>>(),
        )
    };
    let p = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title("Tools"),
    );
    f.render_widget(p, area);
}

fn build_chat_lines(state: &DashState, palette: UiPalette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in &state.chat {
        let (prefix, style) = match message.role {
            ChatRole::User => ("you> ", Style::default().fg(palette.accent)),
            ChatRole::Assistant => ("agent> ", Style::default().fg(palette.success)),
        };
        for (idx, text) in message.text.lines().enumerate() {
            let lead = if idx == 0 { prefix } else { "" };
            lines.push(Line::from(vec![
                Span::styled(lead.to_string(), style.add_modifier(Modifier::BOLD)),
                Span::raw(text.to_string()),
            ]));
        }
        lines.push(Line::from(""));
    }
    if !state.interaction.live_assistant_preview.is_empty() {
        for (idx, text) in state.interaction.live_assistant_preview.lines().enumerate() {
            let lead = if idx == 0 { "agent> " } else { "" };
            lines.push(Line::from(vec![
                Span::styled(lead.to_string(), Style::default().fg(palette.success)),
                Span::styled(text.to_string(), Style::default().fg(palette.muted)),
            ]));
        }
    }
    lines
}

/// Rows the lines take once wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_chat(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let lines = build_chat_lines(state, palette);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let scroll = wrapped_height(&lines, inner_width).saturating_sub(inner_height);
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title("Chat"),
        );
    f.render_widget(p, area);
}

fn render_activity(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let rows = usize::from(area.height.saturating_sub(2));
    let mut entries: Vec<_> = state.logs.iter().rev().take(rows).collect();
    entries.reverse();
    let lines: Vec<Line> = entries
        .into_iter()
        .map(|entry| {
            let level_style = match entry.level {
                LogLevel::Warn => Style::default().fg(palette.warning),
                LogLevel::Info => Style::default().fg(palette.accent_alt),
                LogLevel::Debug => Style::default().fg(palette.muted),
            };
            let context = entry
                .context
                .as_deref()
                .map(|context| format!("{context}: "))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(format!("{:>4} ", entry.seq), Style::default().fg(palette.muted)),
                Span::styled(format!("{:<5} ", entry.level.label()), level_style),
                Span::styled(
                    format!("[{}] ", entry.source.label()),
                    Style::default().fg(palette.muted),
                ),
                Span::raw(format!("{context}{}", entry.message)),
            ])
        })
        .collect();
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title("Activity"),
    );
    f.render_widget(p, area);
}

fn render_footer(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(palette.accent));
    let label = |l: &'static str| Span::styled(l, Style::default().fg(palette.muted));
    let stats = state.stats;
    let line = Line::from(vec![
        key("Tab"),
        label(" focus "),
        key("←/→"),
        label(" cards "),
        key("Esc"),
        label(" latest "),
        key("F1-F4"),
        label(" suggestions "),
        key("?"),
        label(" help "),
        key("q"),
        label(" quit  "),
        Span::styled(
            format!(
                "events {} ok / {} rejected, {} flushes",
                stats.accepted_events, stats.rejected_events, stats.flushes
            ),
            Style::default().fg(palette.muted),
        ),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_help(f: &mut ratatui::Frame, palette: UiPalette) {
    let area = centered_rect(60, 60, f.area());
    let rows = [
        ("Tab", "switch focus between prompt and cards"),
        ("Enter", "send prompt"),
        ("F1-F4", "send a suggested prompt"),
        ("←/→ h/l", "focus previous / next tool card"),
        ("click", "focus a tool card"),
        ("Esc", "follow the latest result"),
        ("r", "toggle raw JSON payload"),
        ("y", "copy payload to clipboard"),
        ("t", "cycle theme"),
        ("a", "toggle activity log"),
        ("n", "new session"),
        ("q / Ctrl-C", "quit"),
    ];
    let mut lines: Vec<Line> = rows
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:<12}"), Style::default().fg(palette.accent)),
                Span::raw(*what),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    for spec in ToolRegistry::list() {
        lines.push(Line::from(Span::styled(
            spec.title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", spec.description),
            Style::default().fg(palette.muted),
        )));
    }
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent))
            .style(Style::default().bg(palette.panel_bg))
            .title("Help"),
    );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
