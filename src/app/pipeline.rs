//! Shared pipeline logic used by both the text commands and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! feed -> normalize -> derive -> snapshot, then per selection: filter -> summary
//!
//! The front-ends can then focus on presentation (printing vs widgets).

use chrono::{DateTime, Local, NaiveDate};
use serde_json::Value;
use tracing::info;

use crate::data::load_feed;
use crate::domain::{FeedSource, Series};
use crate::error::{AppError, PipelineError};
use crate::io::ingest::{IngestReport, IngestedSeries, ingest_value};
use crate::metrics::{FilteredWindow, derive, filter};

/// The enriched, read-only series of one feed download.
///
/// Built once per display cycle; selections borrow it. A refresh builds a new
/// snapshot and drops the old one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Normalizer report (dropped labels, duplicates, label counts).
    pub ingest: IngestReport,
    /// Series with rates and deltas.
    pub series: Series,
    pub loaded_at: DateTime<Local>,
}

impl Snapshot {
    /// Normalize and derive a raw feed document.
    pub fn build(value: &Value) -> Result<Self, PipelineError> {
        // The base series is only needed as the deriver's input.
        let IngestedSeries { series: base, report } = ingest_value(value)?;
        let series = derive(&base);
        info!(
            days = series.len(),
            dropped = report.dropped_count(),
            "snapshot ready"
        );
        Ok(Self {
            ingest: report,
            series,
            loaded_at: Local::now(),
        })
    }

    /// Resolve the user's window the way the date pickers do: missing bounds
    /// default to the first/last date, given bounds are clamped into range.
    ///
    /// An empty series has no window (`EmptySeries`).
    pub fn resolve_window(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate), PipelineError> {
        let (min, max) = self.series.date_bounds().ok_or(PipelineError::EmptySeries)?;
        let start = start.map_or(min, |d| d.clamp(min, max));
        let end = end.map_or(max, |d| d.clamp(min, max));
        Ok((start, end))
    }

    /// Filter the snapshot for one selection.
    pub fn view<S: AsRef<str>>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        metrics: &[S],
    ) -> Result<FilteredWindow<'_>, PipelineError> {
        filter(&self.series, start, end, metrics)
    }
}

/// Fetch/read the feed and build a snapshot.
pub fn load_snapshot(source: &FeedSource) -> Result<Snapshot, AppError> {
    let value = load_feed(source)?;
    Ok(Snapshot::build(&value)?)
}
