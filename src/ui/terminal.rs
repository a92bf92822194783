use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::task::JoinHandle;

use crate::{
    core::{
        engine::{CycleOutcome, Engine},
        error::DashError,
        types::{PasswordCheck, Priority},
    },
    ui::{
        app::{DashboardApp, InputMode},
        charts::{render_bars, render_trend},
    },
};

const TICK: Duration = Duration::from_millis(100);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

type RefreshTask = JoinHandle<Option<CycleOutcome>>;
type PasswordTask = JoinHandle<Result<Option<PasswordCheck>, DashError>>;

pub async fn run_tui(engine: Arc<Engine>, mut app: DashboardApp) -> Result<(), DashError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, engine, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    engine: Arc<Engine>,
    app: &mut DashboardApp,
) -> Result<(), DashError> {
    let poll_interval = Duration::from_secs(engine.config.poll_interval_secs);
    let mut refresh_task: Option<RefreshTask> = Some(spawn_refresh(&engine, app));
    let mut password_task: Option<PasswordTask> = None;
    let mut last_refresh = Instant::now();

    loop {
        let now = Instant::now();
        terminal.draw(|f| draw(f, app, now))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.input_mode {
                    InputMode::Password => match key.code {
                        KeyCode::Esc => app.cancel_password_mode(),
                        KeyCode::Enter => {
                            if let Some(password) = app.submit_password() {
                                if password_task.is_none() {
                                    let engine = engine.clone();
                                    password_task = Some(tokio::spawn(async move {
                                        engine.check_password(&password).await
                                    }));
                                }
                            }
                        }
                        KeyCode::Backspace => {
                            app.password_input.pop();
                        }
                        KeyCode::Char(c) => app.password_input.push(c),
                        _ => {}
                    },
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break
                        }
                        KeyCode::Char('r') => {
                            if refresh_task.is_some() {
                                app.refresh_skipped("previous cycle still running");
                            } else {
                                refresh_task = Some(spawn_refresh(&engine, app));
                                last_refresh = Instant::now();
                            }
                        }
                        KeyCode::Char('p') if !app.checking_password => app.enter_password_mode(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    },
                }
            }
        }

        if refresh_task.is_none() && last_refresh.elapsed() >= poll_interval {
            refresh_task = Some(spawn_refresh(&engine, app));
            last_refresh = Instant::now();
        }

        if let Some(handle) = refresh_task.take() {
            if handle.is_finished() {
                match handle.await {
                    Ok(Some(outcome)) => app.apply_outcome(outcome, Instant::now()),
                    Ok(None) => app.refresh_skipped("refresh guard"),
                    Err(join_err) => app.refresh_failed(&join_err.to_string()),
                }
            } else {
                refresh_task = Some(handle);
            }
        }

        if let Some(handle) = password_task.take() {
            if handle.is_finished() {
                match handle.await {
                    Ok(result) => app.complete_password_check(result),
                    Err(join_err) => {
                        app.complete_password_check(Err(DashError::Network(join_err.to_string())))
                    }
                }
            } else {
                password_task = Some(handle);
            }
        }

        app.tick = app.tick.wrapping_add(1);
    }
    Ok(())
}

fn spawn_refresh(engine: &Arc<Engine>, app: &mut DashboardApp) -> RefreshTask {
    app.start_refresh();
    let engine = engine.clone();
    tokio::spawn(async move { engine.run_cycle().await })
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Critical => Color::Red,
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

pub fn draw(f: &mut Frame<'_>, app: &DashboardApp, now: Instant) {
    let banner = app.banner();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(if banner.is_some() { 3 } else { 0 }),
            Constraint::Length(4),
            Constraint::Percentage(35),
            Constraint::Min(8),
            Constraint::Length(7),
        ])
        .split(f.size());

    draw_header(f, chunks[0], app);
    if let Some(text) = banner {
        let para = Paragraph::new(Line::from(Span::styled(
            format!("🚨 {}", text),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(para, chunks[1]);
    }
    draw_counters(f, chunks[2], app, now);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);
    render_bars(f, middle[0], &app.sector_chart, Color::Cyan, Direction::Horizontal);
    render_trend(f, middle[1], &app.trend_chart);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(chunks[4]);
    draw_feed(f, lower[0], app);
    render_bars(f, lower[1], &app.distribution_chart, Color::Magenta, Direction::Vertical);
    draw_analytics(f, lower[2], app);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[5]);
    draw_password(f, bottom[0], app);
    draw_logs(f, bottom[1], app);
}

fn draw_header(f: &mut Frame<'_>, area: Rect, app: &DashboardApp) {
    let (mode, mode_color) = if app.is_demo() {
        ("DEMO", Color::Yellow)
    } else {
        ("LIVE", Color::Green)
    };
    let updated = app
        .snapshot
        .last_updated
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let mut spans = vec![
        Span::styled(" 🛡️ ", Style::default().fg(Color::Cyan)),
        Span::styled(
            "CYBERNOW",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(mode, Style::default().fg(mode_color).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" | source: {} | updated: {}", app.source_name, updated)),
    ];
    if app.refreshing {
        spans.push(Span::styled(
            format!(" {} refreshing", SPINNER[app.tick % SPINNER.len()]),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        "  r=refresh p=password ↑↓=scroll q=quit",
        Style::default().fg(Color::DarkGray),
    ));
    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn draw_counters(f: &mut Frame<'_>, area: Rect, app: &DashboardApp, now: Instant) {
    let counters = app.displayed_counters(now);
    let cards = [
        ("THREATS TODAY", counters.total, Color::Blue),
        ("CRITICAL", counters.critical, Color::Red),
        ("SECTORS", counters.sectors, Color::Cyan),
        ("MITIGATED", counters.mitigated, Color::Green),
    ];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    for ((title, value, color), col) in cards.into_iter().zip(cols.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().title(format!(" {} ", title)).borders(Borders::ALL));
        f.render_widget(card, *col);
    }
}

fn draw_feed(f: &mut Frame<'_>, area: Rect, app: &DashboardApp) {
    let block = Block::default()
        .title(" 📰 LIVE FEED ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let items: Vec<ListItem> = match &app.snapshot.feed {
        Some(feed) if !feed.items.is_empty() => feed
            .items
            .iter()
            .take(app.feed_limit)
            .skip(app.feed_offset)
            .map(|item| {
                let inc = &item.incident;
                let color = priority_color(inc.priority);
                let when = inc
                    .timestamp
                    .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "--".to_string());
                let sector = if item.sector_inferred {
                    format!("{}*", item.resolved_sector)
                } else {
                    item.resolved_sector.clone()
                };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(
                            format!("[{}] ", inc.priority),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(inc.title.clone(), Style::default().fg(Color::White)),
                    ]),
                    Line::from(vec![
                        Span::styled(format!("  {} ", sector), Style::default().fg(Color::Cyan)),
                        Span::styled(when, Style::default().fg(Color::DarkGray)),
                    ]),
                ])
            })
            .collect(),
        Some(_) => vec![ListItem::new("No incidents reported")],
        None => vec![ListItem::new("Waiting for feed...")],
    };
    f.render_widget(List::new(items).block(block), area);
}

fn draw_analytics(f: &mut Frame<'_>, area: Rect, app: &DashboardApp) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let ratio = app
        .snapshot
        .advanced
        .as_ref()
        .map(|a| a.accuracy_ratio())
        .unwrap_or(0.0);
    let gauge = Gauge::default()
        .block(Block::default().title(" 🤖 ML ACCURACY ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(format!("{:.1}%", ratio * 100.0));
    f.render_widget(gauge, rows[0]);

    let mut lines = Vec::new();
    if let Some(adv) = &app.snapshot.advanced {
        lines.push(Line::from(format!("Anomalies (7d): {}", adv.anomalies_detected)));
    }
    match &app.snapshot.drift {
        Some(drift) => {
            let (label, color) = if drift.drift_detected {
                ("DRIFT DETECTED", Color::Red)
            } else {
                ("stable", Color::Green)
            };
            lines.push(Line::from(vec![
                Span::raw("Drift: "),
                Span::styled(label, Style::default().fg(color)),
            ]));
            if let Some(score) = drift.drift_score {
                lines.push(Line::from(format!("Score: {:.3}", score)));
            }
            if let Some(version) = &drift.model_version {
                lines.push(Line::from(format!("Model: {}", version)));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "Drift status unavailable",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(" 📊 MODEL ").borders(Borders::ALL));
    f.render_widget(para, rows[1]);
}

fn draw_password(f: &mut Frame<'_>, area: Rect, app: &DashboardApp) {
    let editing = app.input_mode == InputMode::Password;
    let masked = "*".repeat(app.password_input.chars().count());
    let input_line = if editing {
        Line::from(vec![
            Span::raw("> "),
            Span::styled(masked, Style::default().fg(Color::Yellow)),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else {
        Line::from(Span::styled(
            "press p to check a password",
            Style::default().fg(Color::DarkGray),
        ))
    };
    let mut lines = vec![input_line];
    if let Some(result) = &app.password_result {
        lines.push(Line::from(result.clone()));
    }
    let border = if editing { Color::Yellow } else { Color::White };
    let para = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(" 🔑 PASSWORD BREACH CHECK ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(para, area);
}

fn draw_logs(f: &mut Frame<'_>, area: Rect, app: &DashboardApp) {
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .take(visible)
        .map(|log| {
            ListItem::new(Line::from(vec![
                Span::styled("●", Style::default().fg(Color::Green)),
                Span::raw(" "),
                Span::raw(log.as_str()),
            ]))
        })
        .collect();
    let logs = List::new(items).block(Block::default().title(" 📜 SYSTEM LOGS ").borders(Borders::ALL));
    f.render_widget(logs, area);
}
