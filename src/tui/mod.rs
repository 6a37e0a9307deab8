//! Ratatui-based terminal UI.
//!
//! The TUI shows the three headline totals, a settings panel for the date
//! window and metric toggles, and two stacked charts (counts, percentages).

use std::io;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::app::pipeline::{load_snapshot, Snapshot};
use crate::domain::{DashboardConfig, FeedSource, Metric, MetricAxis, MetricSet};
use crate::error::{AppError, PipelineError};
use crate::metrics::{filter_metrics, FilteredWindow};
use crate::report::format::{fmt_count, headlines};

mod plotters_chart;

use plotters_chart::{metric_color, ChartLine, TrendChart};

/// Start date, end date, then one toggle per metric.
const FIELD_COUNT: usize = 2 + Metric::ALL.len();
const PAGE_DAYS: u64 = 30;

/// Start the TUI.
///
/// The first fetch happens before the terminal switches to raw mode, so feed
/// and configuration errors print like any other command error.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    let snapshot = load_snapshot(&config.source)?;
    let mut app = App::new(&config, snapshot)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Start,
    End,
    Metric(Metric),
}

impl Field {
    fn at(index: usize) -> Self {
        match index {
            0 => Field::Start,
            1 => Field::End,
            i => Field::Metric(Metric::ALL[(i - 2).min(Metric::ALL.len() - 1)]),
        }
    }
}

struct App {
    source: FeedSource,
    snapshot: Snapshot,
    start: NaiveDate,
    end: NaiveDate,
    metrics: MetricSet,
    selected_field: usize,
    /// Text buffer while a date is being typed.
    date_input: Option<String>,
    status: String,
}

impl App {
    fn new(config: &DashboardConfig, snapshot: Snapshot) -> Result<Self, AppError> {
        let metrics = MetricSet::parse(&config.metrics)?;
        let (start, end) = snapshot.resolve_window(config.start, config.end)?;
        let status = loaded_status(&snapshot);
        Ok(Self {
            source: config.source.clone(),
            snapshot,
            start,
            end,
            metrics,
            selected_field: 0,
            date_input: None,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.date_input.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('[') => self.adjust_field(-(PAGE_DAYS as i64)),
            KeyCode::Char(']') => self.adjust_field(PAGE_DAYS as i64),
            KeyCode::Char(' ') => self.toggle_selected_metric(),
            KeyCode::Enter => match Field::at(self.selected_field) {
                Field::Start | Field::End => {
                    self.date_input = Some(self.selected_date().to_string());
                    self.status = "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
                }
                Field::Metric(_) => self.toggle_selected_metric(),
            },
            KeyCode::Char('r') => self.refresh_snapshot(),
            _ => {}
        }

        false
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        let Some(input) = self.date_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.date_input = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = input.trim().to_string();
                self.date_input = None;
                self.apply_date_input(&text);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    input.push(c);
                }
            }
            _ => {}
        }
    }

    fn selected_date(&self) -> NaiveDate {
        match Field::at(self.selected_field) {
            Field::End => self.end,
            _ => self.start,
        }
    }

    fn set_selected_date(&mut self, date: NaiveDate) {
        // Same policy as the CLI: dates are pinned to the available range.
        let date = self.snapshot.series.clamp(date).unwrap_or(date);
        match Field::at(self.selected_field) {
            Field::Start => self.start = date,
            Field::End => self.end = date,
            Field::Metric(_) => {}
        }
    }

    /// Move a date field by `days`, or toggle a metric field.
    fn adjust_field(&mut self, days: i64) {
        let Field::Metric(_) = Field::at(self.selected_field) else {
            let current = self.selected_date();
            let step = Days::new(days.unsigned_abs());
            let moved = if days >= 0 {
                current.checked_add_days(step)
            } else {
                current.checked_sub_days(step)
            };
            if let Some(date) = moved {
                self.set_selected_date(date);
            }
            self.status = format!("window: {} .. {}", self.start, self.end);
            return;
        };
        self.toggle_selected_metric();
    }

    fn toggle_selected_metric(&mut self) {
        if let Field::Metric(metric) = Field::at(self.selected_field) {
            let on = self.metrics.toggle(metric);
            self.status = format!("{}: {}", metric.display_name(), if on { "shown" } else { "hidden" });
        }
    }

    fn apply_date_input(&mut self, text: &str) {
        match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            Ok(date) => {
                self.set_selected_date(date);
                self.status = format!("window: {} .. {}", self.start, self.end);
            }
            Err(e) => {
                self.status = format!("Invalid date '{text}': {e}");
            }
        }
    }

    /// Refetch the feed. On failure the old snapshot stays on screen.
    fn refresh_snapshot(&mut self) {
        match load_snapshot(&self.source) {
            Ok(snapshot) => {
                let clamp = |d: NaiveDate| snapshot.series.clamp(d).unwrap_or(d);
                self.start = clamp(self.start);
                self.end = clamp(self.end);
                self.status = loaded_status(&snapshot);
                self.snapshot = snapshot;
            }
            Err(err) => {
                self.status = format!("Refresh failed: {err}");
            }
        }
    }

    fn window(&self) -> Result<FilteredWindow<'_>, PipelineError> {
        filter_metrics(&self.snapshot.series, self.start, self.end, self.metrics)
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        let window = self.window();
        self.draw_header(frame, chunks[0], window.as_ref().ok());
        self.draw_body(frame, chunks[1], &window);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect, window: Option<&FilteredWindow<'_>>) {
        let title = format!(
            " COVID-19 Dashboard | {} .. {} ",
            self.start, self.end
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let summary = match window.map(FilteredWindow::summarize) {
            Some(Ok(summary)) => summary,
            Some(Err(err)) => {
                frame.render_widget(Paragraph::new(err.to_string()).style(Style::default().fg(Color::Yellow)), inner);
                return;
            }
            None => return,
        };

        let tiles = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
            .split(inner);

        for (tile, rect) in headlines(&summary).iter().zip(tiles.iter()) {
            let delta_color = if tile.delta.starts_with('-') { Color::Red } else { Color::Green };
            let text = Text::from(vec![
                Line::from(Span::styled(tile.label, Style::default().fg(Color::Gray))),
                Line::from(Span::styled(
                    tile.value.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(tile.delta.clone(), Style::default().fg(delta_color))),
            ]);
            frame.render_widget(Paragraph::new(text), *rect);
        }
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect, window: &Result<FilteredWindow<'_>, PipelineError>) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        self.draw_settings(frame, chunks[0]);

        let window = match window {
            Ok(window) => window,
            Err(err) => {
                let msg = Paragraph::new(err.to_string())
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().title("Trends").borders(Borders::ALL));
                frame.render_widget(msg, chunks[1]);
                return;
            }
        };

        let panels: Vec<(MetricAxis, &str)> = [(MetricAxis::Count, "Counts"), (MetricAxis::Percent, "Rates (%)")]
            .into_iter()
            .filter(|(axis, _)| window.metrics().iter().any(|m| m.axis() == *axis))
            .collect();

        if panels.is_empty() {
            let msg = Paragraph::new("No metrics selected (Space toggles a metric).")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("Trends").borders(Borders::ALL));
            frame.render_widget(msg, chunks[1]);
            return;
        }

        let constraints = vec![Constraint::Ratio(1, panels.len() as u32); panels.len()];
        let rects = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(chunks[1]);

        for ((axis, title), rect) in panels.into_iter().zip(rects.iter()) {
            draw_chart(frame, *rect, window, axis, title);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let date_item = |field: Field, label: &str, date: NaiveDate| {
            let editing = self.date_input.as_ref().filter(|_| Field::at(self.selected_field) == field);
            match editing {
                Some(input) => ListItem::new(format!("{label}: {input}_")),
                None => ListItem::new(format!("{label}: {date}")),
            }
        };

        let mut items = vec![
            date_item(Field::Start, "Start", self.start),
            date_item(Field::End, "End", self.end),
        ];
        for metric in Metric::ALL {
            let mark = if self.metrics.contains(metric) { "[x]" } else { "[ ]" };
            items.push(ListItem::new(Line::from(vec![
                Span::raw(format!("{mark} ")),
                Span::styled(metric.display_name(), Style::default().fg(metric_color(metric))),
            ])));
        }

        let days = self.snapshot.series.len();
        let range = self
            .snapshot
            .series
            .date_bounds()
            .map(|(min, max)| format!("{min} .. {max}"))
            .unwrap_or_else(|| "-".to_string());
        items.push(ListItem::new(""));
        items.push(ListItem::new(Span::styled(
            format!("Data: {} days", fmt_count(days as u64)),
            Style::default().fg(Color::Gray),
        )));
        items.push(ListItem::new(Span::styled(range, Style::default().fg(Color::Gray))));

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ ±1 day  [/] ±30 days  Enter edit  Space toggle  r refresh  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn loaded_status(snapshot: &Snapshot) -> String {
    let dropped = snapshot.ingest.dropped_count();
    let mut status = format!(
        "Loaded {} days at {}",
        snapshot.series.len(),
        snapshot.loaded_at.format("%H:%M:%S")
    );
    if dropped > 0 {
        status.push_str(&format!(" ({dropped} labels dropped)"));
    }
    status
}

fn draw_chart(frame: &mut ratatui::Frame<'_>, area: Rect, window: &FilteredWindow<'_>, axis: MetricAxis, title: &str) {
    let legend: Vec<Span> = window
        .metrics()
        .iter()
        .filter(|m| m.axis() == axis)
        .flat_map(|m| {
            [
                Span::raw(" "),
                Span::styled(format!("━ {}", m.display_name()), Style::default().fg(metric_color(m))),
            ]
        })
        .collect();
    let mut title_spans = vec![Span::raw(format!(" {title} |"))];
    title_spans.extend(legend);
    title_spans.push(Span::raw(" "));

    let block = Block::default().title(Line::from(title_spans)).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let Some(data) = chart_series(window, axis) else {
        let msg = Paragraph::new("No defined values in window.").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    };

    let widget = TrendChart {
        lines: &data.lines,
        x_bounds: data.x_bounds,
        y_bounds: data.y_bounds,
        x_origin: data.origin,
        y_label: match axis {
            MetricAxis::Count => "count",
            MetricAxis::Percent => "%",
        },
        fmt_y: match axis {
            MetricAxis::Count => fmt_axis_count,
            MetricAxis::Percent => fmt_axis_percent,
        },
    };
    frame.render_widget(widget, inner);
}

/// Lines and bounds of one chart panel.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    lines: Vec<ChartLine>,
    origin: NaiveDate,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build the plotters series for the metrics of one axis.
///
/// `None` when the window is empty or no selected metric has a defined value.
fn chart_series(window: &FilteredWindow<'_>, axis: MetricAxis) -> Option<ChartData> {
    let origin = window.records().first()?.date;
    let last = window.records().last()?.date;

    let lines: Vec<ChartLine> = window
        .metrics()
        .iter()
        .filter(|m| m.axis() == axis)
        .map(|metric| ChartLine {
            metric,
            points: window
                .column(metric)
                .into_iter()
                .map(|(date, y)| ((date - origin).num_days() as f64, y))
                .collect(),
        })
        .collect();

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in lines.iter().flat_map(|l| l.points.iter()) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    // A one-day window still needs a non-empty x range.
    let span = ((last - origin).num_days() as f64).max(1.0);

    Some(ChartData {
        lines,
        origin,
        x_bounds: [0.0, span],
        y_bounds: [y_min - pad, y_max + pad],
    })
}

fn fmt_axis_count(v: f64) -> String {
    let v = v.max(0.0);
    if v >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if v >= 1e3 {
        format!("{:.0}k", v / 1e3)
    } else {
        format!("{v:.0}")
    }
}

fn fmt_axis_percent(v: f64) -> String {
    format!("{v:.1}")
}
