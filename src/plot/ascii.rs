//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! The window is drawn as up to two panels sharing the date axis:
//! cumulative counts, then percentages. Each metric is a line drawn with its
//! own marker (`c` cases, `d` deaths, `r` recovered, `R` recovery rate,
//! `M` mortality rate).

use chrono::NaiveDate;

use crate::domain::{Metric, MetricAxis};
use crate::metrics::FilteredWindow;

/// Render both panels for a filtered window.
pub fn render_ascii_plot(window: &FilteredWindow<'_>, width: usize, height: usize) -> String {
    let (Some(first), Some(last)) = (window.records().first(), window.records().last()) else {
        return format!("No data in window {} .. {}\n", window.start(), window.end());
    };
    if window.metrics().is_empty() {
        return "No metrics selected.\n".to_string();
    }

    let width = width.max(10);
    let height = height.max(5);
    let origin = first.date;
    let span = ((last.date - origin).num_days() as f64).max(1.0);

    let mut out = String::new();
    for (axis, title, unit) in [
        (MetricAxis::Count, "Counts", ""),
        (MetricAxis::Percent, "Rates", "%"),
    ] {
        let metrics: Vec<Metric> = window.metrics().iter().filter(|m| m.axis() == axis).collect();
        if metrics.is_empty() {
            continue;
        }

        let lines: Vec<(char, Vec<(f64, f64)>)> = metrics
            .iter()
            .map(|&m| {
                let pts = window
                    .column(m)
                    .into_iter()
                    .map(|(date, y)| (days_since(origin, date), y))
                    .collect();
                (marker(m), pts)
            })
            .collect();

        out.push_str(&render_panel(
            title, unit, &lines, &metrics, first.date, last.date, span, width, height,
        ));
    }

    out
}

#[allow(clippy::too_many_arguments)]
fn render_panel(
    title: &str,
    unit: &str,
    lines: &[(char, Vec<(f64, f64)>)],
    metrics: &[Metric],
    first: NaiveDate,
    last: NaiveDate,
    span: f64,
    width: usize,
    height: usize,
) -> String {
    let Some((y_min, y_max)) = y_range(lines) else {
        return format!("{title}: no defined values in window\n");
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for (ch, pts) in lines {
        draw_curve(&mut grid, pts, span, y_min, y_max, *ch);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{title}: {first} .. {last} | y=[{y_min:.2}, {y_max:.2}]{unit}\n"
    ));
    let legend: Vec<String> = metrics.iter().map(|m| format!("{}={}", marker(*m), m.name())).collect();
    out.push_str(&format!("  {}\n", legend.join(" ")));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out.push_str(&date_axis(first, last, width));
    out.push('\n');

    out
}

fn marker(metric: Metric) -> char {
    match metric {
        Metric::Cases => 'c',
        Metric::Deaths => 'd',
        Metric::Recovered => 'r',
        Metric::RecoveryRate => 'R',
        Metric::MortalityRate => 'M',
    }
}

fn days_since(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// `first` at the left edge, `last` at the right edge (when both fit).
fn date_axis(first: NaiveDate, last: NaiveDate, width: usize) -> String {
    let left = first.to_string();
    let right = last.to_string();
    if first == last || width < left.len() + right.len() + 1 {
        return left;
    }
    format!("{left}{right:>pad$}", pad = width - left.len())
}

fn y_range(lines: &[(char, Vec<(f64, f64)>)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (_, pts) in lines {
        for &(_, y) in pts {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat line: give it some room so it renders mid-panel.
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, span: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = (t / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], pts: &[(f64, f64)], span: f64, y_min: f64, y_max: f64, ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in pts {
        let x = map_x(t, span, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, ch);
        }
        // Observations always show, even where another line passed first.
        grid[yy][x] = ch;
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
