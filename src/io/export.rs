//! Export the selected window to CSV and its headline summary to JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per day, `date` first, then the selected metrics. Undefined rates are
//! empty cells.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Metric, MetricValue};
use crate::error::AppError;
use crate::metrics::FilteredWindow;
use crate::report::summary::Summary;

/// Write the window's rows to a CSV file.
pub fn write_window_csv(path: &Path, window: &FilteredWindow<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_window(csv::Writer::from_writer(file), window)
}

fn write_window<W: std::io::Write>(mut writer: csv::Writer<W>, window: &FilteredWindow<'_>) -> Result<(), AppError> {
    let mut header = vec!["date"];
    header.extend(window.metrics().iter().map(Metric::name));
    writer
        .write_record(&header)
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for row in window.rows() {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
        record.extend(row.values.iter().map(|(_, v)| csv_cell(*v)));
        writer
            .write_record(&record)
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))
}

fn csv_cell(value: MetricValue) -> String {
    match value {
        MetricValue::Count(v) => v.to_string(),
        MetricValue::Rate(v) => format!("{v:.2}"),
        MetricValue::Undefined => String::new(),
    }
}

/// JSON document written by `covid export --json`.
#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    tool: &'static str,
    start: NaiveDate,
    end: NaiveDate,
    rows: usize,
    metrics: Vec<Metric>,
    summary: &'a Summary,
}

/// Write the headline summary (plus the window it was computed over) as JSON.
pub fn write_summary_json(path: &Path, summary: &Summary, window: &FilteredWindow<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    let doc = SummaryFile {
        tool: "covid",
        start: window.start(),
        end: window.end(),
        rows: window.len(),
        metrics: window.metrics().iter().collect(),
        summary,
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::io(format!("Failed to write summary JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DailyRecord, Series};
    use crate::metrics::{derive, filter};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    #[test]
    fn csv_has_selected_columns_and_blank_undefined_cells() {
        let series = derive(&Series::from_sorted(vec![
            DailyRecord::new(d(1), 0, 0, 0),
            DailyRecord::new(d(2), 15, 2, 8),
        ]));
        let window = filter(&series, d(1), d(2), &["recovery_rate", "cases"]).unwrap();

        let mut buf = Vec::new();
        write_window(csv::Writer::from_writer(&mut buf), &window).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "date,cases,recovery_rate\n2021-01-01,0,\n2021-01-02,15,53.33\n");
    }

    #[test]
    fn summary_json_shape() {
        let series = derive(&Series::from_sorted(vec![
            DailyRecord::new(d(1), 10, 1, 5),
            DailyRecord::new(d(2), 15, 2, 8),
        ]));
        let window = filter(&series, d(1), d(2), &["cases"]).unwrap();
        let summary = window.summarize().unwrap();
        let doc = SummaryFile {
            tool: "covid",
            start: window.start(),
            end: window.end(),
            rows: window.len(),
            metrics: window.metrics().iter().collect(),
            summary: &summary,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["summary"]["totals"]["cases"], 15);
        assert_eq!(value["summary"]["daily"]["recovered"], 3);
        assert_eq!(value["metrics"][0], "cases");
        assert_eq!(value["start"], "2021-01-01");
    }
}
