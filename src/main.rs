use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use ratings_terminal::config::{self, RatingsConfig, RatingsSource};
use ratings_terminal::state::{self, apply_delta, AppState, Focus, ProviderCommand};
use ratings_terminal::worker::spawn_ratings_worker;

const HIGH_RATING_COLOR: Color = Color::Rgb(0xe2, 0xb3, 0x40);

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    source_label: String,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>, source_label: String) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            source_label,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            self.should_quit = true;
            return;
        }

        if self.state.notice_blocks_input() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_notice();
            }
            return;
        }

        if self.state.help_overlay {
            if matches!(key.code, KeyCode::F(1) | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('s') if ctrl => self.submit(),
            KeyCode::F(5) => self.submit(),
            KeyCode::Char('l') if ctrl => self.state.clear_input(),
            KeyCode::F(1) => self.state.help_overlay = true,
            KeyCode::Tab => self.state.toggle_focus(),
            _ => match self.state.focus {
                Focus::Names => self.on_names_key(key, ctrl),
                Focus::Results => self.on_results_key(key),
            },
        }
    }

    fn on_names_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Enter => self.state.insert_newline(),
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Char(ch) if !ctrl => self.state.insert_char(ch),
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let Some(cmd) = self.state.press_submit() else {
            return;
        };
        let request_id = self.state.latest_request;
        let sent = match &self.cmd_tx {
            Some(tx) => tx.send(cmd).is_ok(),
            None => false,
        };
        if !sent {
            apply_delta(
                &mut self.state,
                state::Delta::RatingsFailed {
                    request_id,
                    error: "ratings worker unavailable".to_string(),
                },
            );
        }
    }
}

fn main() -> io::Result<()> {
    config::load_dotenv();
    let cfg = RatingsConfig::from_env();
    let service = match config::build_service(&cfg) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };
    let source_label = match cfg.source {
        RatingsSource::Http => cfg.ratings_url(),
        RatingsSource::Demo => "demo".to_string(),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_ratings_worker(service, tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx), source_label);
    for warning in &cfg.warnings {
        app.state.push_log(format!("[WARN] {warning}"));
    }
    app.state
        .push_log(format!("[INFO] Ratings source: {}", app.source_label));

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(6),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    render_names(frame, body[0], &app.state);
    render_results(frame, body[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if let Some(notice) = &app.state.notice {
        render_notice(frame, frame.size(), notice);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let trigger = if app.state.busy {
        Span::styled(
            format!(" Fetching {} names... ", app.state.pending_names),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(
            " [ Fetch Ratings ] ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    };
    let line = Line::from(vec![
        Span::styled("PLAYER RATINGS", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" | {} | ", app.source_label)),
        trigger,
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn render_names(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus == Focus::Names;
    let block = Block::default()
        .title("Player names (one per line)")
        .borders(Borders::ALL)
        .border_style(focus_style(focused));
    let inner = block.inner(area);

    let mut text = state.input.clone();
    if focused && state.notice.is_none() {
        text.push('▏');
    }
    let lines = text.split('\n').count() as u16;
    let scroll = lines.saturating_sub(inner.height);

    let names = Paragraph::new(text).block(block).scroll((scroll, 0));
    frame.render_widget(names, area);
}

fn render_results(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus == Focus::Results;
    let mut title = "Results".to_string();
    if state.results_visible {
        title.push_str(&format!(" - {}", state.result_count));
        if let Some(updated) = &state.last_updated {
            title.push_str(&format!(" (updated {updated})"));
        }
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(focus_style(focused));

    if !state.results_visible {
        let hint = if state.busy {
            "Fetching ratings..."
        } else {
            "Enter names and press Ctrl-S to fetch ratings"
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![Cell::from("Name"), Cell::from("Rating")])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = state.rows.iter().map(|row| {
        let rating_style = if row.emphasized {
            Style::default()
                .fg(HIGH_RATING_COLOR)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(row.name.clone()),
            Cell::from(row.rating.clone()).style(rating_style),
        ])
    });

    let table = Table::new(rows, [Constraint::Min(20), Constraint::Length(10)])
        .header(header)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state = TableState::default();
    if focused && !state.rows.is_empty() {
        table_state.select(Some(state.selected));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No activity yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn footer_text(state: &AppState) -> String {
    match state.focus {
        Focus::Names => {
            "Type names | Enter New line | Ctrl-S/F5 Fetch | Ctrl-L Clear | Tab Results | F1 Help | Ctrl-Q Quit".to_string()
        }
        Focus::Results => {
            "j/k/↑/↓ Move | Ctrl-S/F5 Fetch | Tab Names | F1 Help | Ctrl-Q Quit".to_string()
        }
    }
}

fn render_notice(frame: &mut Frame, area: Rect, notice: &str) {
    let popup_area = centered_rect(50, 25, area);
    frame.render_widget(Clear, popup_area);

    let text = format!("{notice}\n\nPress Enter or Esc to dismiss");
    let popup = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Notice")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    frame.render_widget(popup, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Player Ratings - Help",
        "",
        "Names box:",
        "  type         Edit names, one per line",
        "  Enter        New line",
        "  Backspace    Delete",
        "  Ctrl-L       Clear all names",
        "",
        "Global:",
        "  Ctrl-S / F5  Fetch ratings",
        "  Tab          Switch names/results",
        "  j/k or ↑/↓   Move in results",
        "  F1 / Esc     Toggle help",
        "  Ctrl-Q       Quit",
        "",
        "Ratings of 2000 and above are shown in gold.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
