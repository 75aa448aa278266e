use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};

use t20_win_predictor::config::{AppConfig, load_dotenv};
use t20_win_predictor::form::{FormField, FormState, ResultView};
use t20_win_predictor::predict::Predictor;
use t20_win_predictor::reference::{self, ReferenceData};

struct App {
    state: FormState,
    predictor: &'static Predictor,
    should_quit: bool,
}

impl App {
    fn new(reference: &'static ReferenceData) -> Self {
        let mut state = FormState::new(reference.teams.clone(), reference.venues.clone());
        state.push_log(format!(
            "[INFO] Loaded {} teams, {} venues",
            reference.teams.len(),
            reference.venues.len()
        ));
        Self {
            state,
            predictor: &reference.predictor,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.state.help_overlay {
                    self.state.help_overlay = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Down | KeyCode::Tab => self.state.select_next(),
            KeyCode::Up | KeyCode::BackTab => self.state.select_prev(),
            KeyCode::Right => self.state.cycle(true),
            KeyCode::Left => self.state.cycle(false),
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Enter => self.predict(),
            KeyCode::Char(c) => self.state.type_char(c),
            _ => {}
        }
    }

    fn predict(&mut self) {
        let stamp = Local::now().format("%H:%M:%S");
        let snapshot = match self.state.to_snapshot() {
            Ok(s) => s,
            Err(err) => {
                self.state.push_log(format!("[ERROR] {stamp} {err}"));
                return;
            }
        };
        match self.predictor.predict(&snapshot) {
            Ok(prediction) => {
                self.state.push_log(format!(
                    "[INFO] {stamp} {} {:.2}% / {} {:.2}%{}",
                    snapshot.batting_team,
                    prediction.probability.win * 100.0,
                    snapshot.bowling_team,
                    prediction.probability.loss * 100.0,
                    if prediction.overridden { " (settled)" } else { "" }
                ));
                self.state.result = Some(ResultView {
                    batting_team: snapshot.batting_team,
                    bowling_team: snapshot.bowling_team,
                    probability: prediction.probability,
                    overridden: prediction.overridden,
                });
            }
            Err(err) => {
                self.state.result = None;
                self.state.push_log(format!("[ERROR] {stamp} {err}"));
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    load_dotenv();
    let config = AppConfig::from_env();
    // Load-or-fail before touching the terminal so errors print normally.
    let reference = reference::init(&config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(reference);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
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
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    render_form(frame, body[0], &app.state);
    render_result(frame, body[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "↑/↓ Field | ←/→ Change | 0-9 . Type | Backspace | Enter Predict | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let opts = app.predictor.options();
    let variant = if opts.extended { "EXTENDED" } else { "BASIC" };
    let line1 = format!("  T20I WIN PREDICTOR | {} overs | {variant}", opts.match_overs);
    let line2 = "   o  /".to_string();
    let line3 = "  /|\\/".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn render_form(frame: &mut Frame, area: Rect, state: &FormState) {
    let block = Block::default().title("Match State").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let focused = state.focused();
    for (i, field) in state.fields().into_iter().enumerate() {
        let y = inner.y + i as u16;
        if y >= inner.y + inner.height {
            break;
        }
        let row_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: 1,
        };
        let selected = field == focused;
        let style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let value = state.display_value(field);
        let value = if field.is_numeric() || !selected {
            value
        } else {
            format!("< {value} >")
        };
        let text = format!("{:<20} {value}", field.label());
        frame.render_widget(Paragraph::new(text).style(style), row_area);
    }
}

fn render_result(frame: &mut Frame, area: Rect, state: &FormState) {
    let block = Block::default().title("Win Probability").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(result) = &state.result else {
        let empty = Paragraph::new("Press Enter to predict")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(
        probability_gauge(&result.batting_team, result.probability.win, Color::Green),
        rows[0],
    );
    frame.render_widget(
        probability_gauge(&result.bowling_team, result.probability.loss, Color::Red),
        rows[1],
    );
    if result.overridden {
        let note = Paragraph::new("Chase settled: result is certain")
            .style(Style::default().add_modifier(Modifier::ITALIC));
        frame.render_widget(note, rows[2]);
    }
}

fn probability_gauge(team: &str, p: f64, color: Color) -> Gauge<'static> {
    let ratio = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    Gauge::default()
        .block(Block::default().title(team.to_string()))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{:.2}%", ratio * 100.0))
}

fn console_text(state: &FormState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
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

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "T20I Win Predictor - Help",
        "",
        "  ↑/↓ Tab      Move between fields",
        "  ←/→          Change team, venue, toss, innings",
        "  0-9 .        Edit runs, overs, wickets, target",
        "  Backspace    Delete a digit",
        "  Enter        Predict",
        "  ?            Toggle help",
        "  q / Esc      Quit",
        "",
        "Overs use cricket notation: 12.4 is 12 overs and 4 balls.",
        "Target runs is only asked for in the second innings.",
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
