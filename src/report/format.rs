//! Formatted terminal output: headline metrics, ingest diagnostics, tables.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{Metric, MetricValue, Series};
use crate::io::ingest::IngestReport;
use crate::metrics::FilteredWindow;
use crate::report::summary::Summary;

/// One headline tile: label, total and "today" delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub label: &'static str,
    pub value: String,
    pub delta: String,
}

/// The three headline tiles (cases, deaths, recovered).
pub fn headlines(summary: &Summary) -> [Headline; 3] {
    let daily = summary.daily_or_zero();
    let tile = |label, total: u64, delta: i64| Headline {
        label,
        value: fmt_count(total),
        delta: format!("{} today", fmt_delta(delta)),
    };
    [
        tile("Total Cases", summary.totals.cases, daily.cases),
        tile("Total Deaths", summary.totals.deaths, daily.deaths),
        tile("Total Recovered", summary.totals.recovered, daily.recovered),
    ]
}

/// Headline block as printed by `covid summary`.
pub fn format_headline(summary: &Summary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Key COVID-19 metrics (as of {}):\n", summary.date));
    for h in headlines(summary) {
        out.push_str(&format!("  {:<16} {:>16}  ({})\n", h.label, h.value, h.delta));
    }
    out
}

/// Dataset header: source size, dropped labels, duplicates, selected window.
pub fn format_ingest_report(report: &IngestReport, series: &Series, window: &FilteredWindow<'_>) -> String {
    let mut out = String::new();

    out.push_str("=== covid - COVID-19 trends ===\n");
    match series.date_bounds() {
        Some((min, max)) => out.push_str(&format!(
            "Data: {} days | {min} .. {max}\n",
            series.len()
        )),
        None => out.push_str("Data: 0 days\n"),
    }
    out.push_str(&format!(
        "Labels: read={} used={} dropped={} duplicate_dates={}\n",
        report.labels_read,
        report.labels_used,
        report.dropped_count(),
        report.duplicate_dates.len()
    ));
    for dropped in &report.dropped {
        out.push_str(&format!("  (dropped) {}\n", dropped.error));
    }
    out.push_str(&format!(
        "Window: {} .. {} | rows={} | metrics={}\n",
        window.start(),
        window.end(),
        window.len(),
        metric_list(window)
    ));

    out
}

/// Per-day table of the window's requested columns.
pub fn format_window_table(window: &FilteredWindow<'_>) -> String {
    let metrics: Vec<Metric> = window.metrics().iter().collect();
    let mut out = String::new();

    let mut header = format!("{:<10}", "date");
    let mut rule = format!("{:-<10}", "");
    for m in &metrics {
        header.push_str(&format!(" {:>16}", m.name()));
        rule.push_str(&format!(" {:-<16}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for row in window.rows() {
        let mut line = row.date.format("%Y-%m-%d").to_string();
        for (_, value) in &row.values {
            line.push_str(&format!(" {:>16}", fmt_value(*value)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn metric_list(window: &FilteredWindow<'_>) -> String {
    if window.metrics().is_empty() {
        return "-".to_string();
    }
    let names: Vec<&str> = window.metrics().iter().map(Metric::name).collect();
    names.join(",")
}

pub fn fmt_value(value: MetricValue) -> String {
    match value {
        MetricValue::Count(v) => fmt_count(v),
        MetricValue::Rate(v) => format!("{v:.2}%"),
        MetricValue::Undefined => "-".to_string(),
    }
}

/// Integer with `,` thousands separators.
pub fn fmt_count(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Signed delta with separators: `+1,234`, `-5`, `+0`.
pub fn fmt_delta(v: i64) -> String {
    let sign = if v < 0 { '-' } else { '+' };
    format!("{sign}{}", fmt_count(v.unsigned_abs()))
}
