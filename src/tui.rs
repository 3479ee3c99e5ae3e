use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::Receiver;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, List, ListItem, Paragraph,
    },
    Frame, Terminal,
};

use crate::graph::{project, vertical_scale, Direction, PixelRect, ScalePolicy, Vertex};
use crate::sampler::TickSample;
use crate::series::SeriesStore;
use crate::units::{format_rate, status_line};

const UP_COLOR: Color = Color::Rgb(255, 24, 32);
const DOWN_COLOR: Color = Color::Rgb(48, 48, 255);
const MAX_LOG_LINES: usize = 100;

/// Render loop. Owns the series history; rates arrive on `ticks`, log lines
/// on `events`. Redraws on a 200 ms poll so key handling stays responsive
/// between one-second samples.
pub fn run_tui(
    initial_policy: ScalePolicy,
    ticks: Receiver<TickSample>,
    events: Receiver<String>,
    stop: Arc<AtomicBool>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut store = SeriesStore::default();
    let mut policy = initial_policy;
    let mut latest: Option<TickSample> = None;
    let mut logs: Vec<String> = Vec::new();
    let mut log_scroll: usize = 0;

    while !stop.load(Ordering::Relaxed) {
        while let Ok(line) = events.try_recv() {
            logs.push(line);
            if logs.len() > MAX_LOG_LINES {
                logs.remove(0);
            }
        }
        let mut sampled = false;
        while let Ok(sample) = ticks.try_recv() {
            store.record(sample.stamp, sample.recv_rate, sample.sent_rate);
            latest = Some(sample);
            sampled = true;
        }
        if sampled {
            // The status collaborator: mirror the rates into the terminal
            // title the way a tray tooltip would carry them.
            if let Some(sample) = latest {
                let _ = execute!(
                    terminal.backend_mut(),
                    SetTitle(status_line(sample.sent_rate, sample.recv_rate))
                );
            }
        }

        terminal.draw(|f| {
            draw(f, &store, policy, latest.as_ref(), &logs, log_scroll);
        })?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q')
                    || (key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL))
                {
                    stop.store(true, Ordering::Relaxed);
                } else {
                    match key.code {
                        KeyCode::Char('s') => {
                            policy = policy.toggled();
                        }
                        KeyCode::Char('c') => {
                            logs.clear();
                            log_scroll = 0;
                        }
                        KeyCode::Up => {
                            log_scroll = log_scroll.saturating_add(1);
                        }
                        KeyCode::Down => {
                            log_scroll = log_scroll.saturating_sub(1);
                        }
                        KeyCode::Home => {
                            log_scroll = 0;
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn draw(
    f: &mut Frame,
    store: &SeriesStore,
    policy: ScalePolicy,
    latest: Option<&TickSample>,
    logs: &[String],
    log_scroll: usize,
) {
    let outer = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints(
            [
                Constraint::Length(4), // Rates + window
                Constraint::Min(8),    // Graph
                Constraint::Length(6), // Events
                Constraint::Length(1), // Footer
            ]
            .as_ref(),
        )
        .split(f.size());

    draw_header(f, outer[0], store, latest);
    draw_graph(f, outer[1], store, policy);
    draw_events(f, outer[2], logs, log_scroll);

    let footer =
        Paragraph::new("q: quit | s: toggle scale | \u{2191}/\u{2193}/Home: scroll events | c: clear events");
    f.render_widget(footer, outer[3]);
}

fn draw_header(f: &mut Frame, area: Rect, store: &SeriesStore, latest: Option<&TickSample>) {
    let (sent_rate, recv_rate) = latest.map_or((0, 0), |s| (s.sent_rate, s.recv_rate));

    // Arrow lights up while its direction carries traffic.
    let arrow = |symbol: &'static str, color: Color, active: bool| {
        let style = if active {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(symbol, style)
    };

    let rates = Line::from(vec![
        arrow("\u{25b2} ", UP_COLOR, sent_rate > 0),
        Span::raw(format_rate(sent_rate)),
        Span::raw("    "),
        arrow("\u{25bc} ", DOWN_COLOR, recv_rate > 0),
        Span::raw(format_rate(recv_rate)),
    ]);

    let window = if store.up().is_empty() {
        Line::from("window: collecting...")
    } else {
        let span_seconds = store
            .up()
            .span_seconds()
            .max(store.down().span_seconds());
        let end = chrono::Local::now();
        let start = end - chrono::Duration::seconds(span_seconds as i64);
        let (min, max) = store.min_max();
        Line::from(format!(
            "window {} .. {}   min {}   max {}",
            start.format("%H:%M:%S"),
            end.format("%H:%M:%S"),
            format_rate(min),
            format_rate(max),
        ))
    };

    let header = Paragraph::new(vec![rates, window])
        .block(Block::default().title("netmeter").borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_graph(f: &mut Frame, area: Rect, store: &SeriesStore, policy: ScalePolicy) {
    let block = Block::default()
        .title(format!("throughput [{} scale]", policy.label()))
        .borders(Borders::ALL);
    let plot = block.inner(area);

    // Braille cells give 2x4 dots per character cell.
    let rect = PixelRect {
        width: f64::from(plot.width) * 2.0,
        height: f64::from(plot.height) * 4.0,
    };

    let (min, max) = store.min_max();
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, rect.width])
        .y_bounds([0.0, rect.height])
        .paint(|ctx| {
            // Nothing worth drawing until the window has a spread.
            if max <= min {
                return;
            }
            let scale = vertical_scale(policy, store.up().max_value(), store.down().max_value());
            let up = project(store.up(), scale.up_max, rect, Direction::Up);
            let down = project(store.down(), scale.down_max, rect, Direction::Down);
            draw_polygon(ctx, &up, rect.height, UP_COLOR);
            draw_polygon(ctx, &down, rect.height, DOWN_COLOR);
        });
    f.render_widget(canvas, area);
}

// The projector hands out raster coordinates (y down); the canvas wants
// math coordinates (y up), so flip against the rect height.
fn draw_polygon(
    ctx: &mut ratatui::widgets::canvas::Context<'_>,
    polygon: &[Vertex],
    height: f64,
    color: Color,
) {
    if polygon.len() < 2 {
        return;
    }
    for pair in polygon.windows(2) {
        ctx.draw(&CanvasLine {
            x1: pair[0].x,
            y1: height - pair[0].y,
            x2: pair[1].x,
            y2: height - pair[1].y,
            color,
        });
    }
    let first = polygon[0];
    let last = polygon[polygon.len() - 1];
    ctx.draw(&CanvasLine {
        x1: last.x,
        y1: height - last.y,
        x2: first.x,
        y2: height - first.y,
        color,
    });
}

fn draw_events(f: &mut Frame, area: Rect, logs: &[String], log_scroll: usize) {
    let viewport = area.height.saturating_sub(2) as usize;
    let start = logs.len().saturating_sub(viewport + log_scroll);
    let items: Vec<ListItem> = logs
        .iter()
        .skip(start)
        .map(|l| ListItem::new(l.clone()))
        .collect();
    let list = List::new(items).block(Block::default().title("Events").borders(Borders::ALL));
    f.render_widget(list, area);
}
