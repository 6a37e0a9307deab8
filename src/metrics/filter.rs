//! Range filter: a contiguous date window plus a subset of metric columns.
//!
//! The filter never clamps. Bounds outside the series are rejected so that the
//! clamping policy stays with the caller (see `Series::clamp`).

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{DailyRecord, Metric, MetricSet, MetricValue, Series};
use crate::error::PipelineError;
use crate::report::summary::{Summary, summarize};

/// A borrowed view of the records in `[start, end]`.
#[derive(Debug, Clone, Copy)]
pub struct FilteredWindow<'a> {
    records: &'a [DailyRecord],
    metrics: MetricSet,
    start: NaiveDate,
    end: NaiveDate,
}

/// One row of a window with only the requested columns populated.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRow {
    pub date: NaiveDate,
    pub values: Vec<(Metric, MetricValue)>,
}

impl WindowRow {
    /// The cell for `metric`, or `None` if the column was not requested.
    pub fn get(&self, metric: Metric) -> Option<MetricValue> {
        self.values
            .iter()
            .find_map(|(m, v)| (*m == metric).then_some(*v))
    }
}

impl<'a> FilteredWindow<'a> {
    pub fn records(&self) -> &'a [DailyRecord] {
        self.records
    }

    pub fn metrics(&self) -> MetricSet {
        self.metrics
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> Vec<WindowRow> {
        self.records
            .iter()
            .map(|r| WindowRow {
                date: r.date,
                values: self.metrics.iter().map(|m| (m, r.value(m))).collect(),
            })
            .collect()
    }

    /// `(date, value)` pairs of one column; undefined cells are skipped.
    pub fn column(&self, metric: Metric) -> Vec<(NaiveDate, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.value(metric).as_f64().map(|v| (r.date, v)))
            .collect()
    }

    /// Headline numbers for this window.
    pub fn summarize(&self) -> Result<Summary, PipelineError> {
        summarize(self.records)
    }
}

/// Select `[start, end]` and the named metric columns.
///
/// Checks, in order: `start <= end`, both bounds within the series, metric
/// names known. A window inside the domain that holds no records is valid.
pub fn filter<'a, S: AsRef<str>>(
    series: &'a Series,
    start: NaiveDate,
    end: NaiveDate,
    metric_names: &[S],
) -> Result<FilteredWindow<'a>, PipelineError> {
    check_bounds(series, start, end)?;
    let metrics = MetricSet::parse(metric_names)?;
    Ok(select(series, start, end, metrics))
}

/// Same as `filter`, for callers that already hold parsed metrics.
pub fn filter_metrics(
    series: &Series,
    start: NaiveDate,
    end: NaiveDate,
    metrics: MetricSet,
) -> Result<FilteredWindow<'_>, PipelineError> {
    check_bounds(series, start, end)?;
    Ok(select(series, start, end, metrics))
}

fn check_bounds(series: &Series, start: NaiveDate, end: NaiveDate) -> Result<(), PipelineError> {
    if start > end {
        return Err(PipelineError::InvalidRange { start, end });
    }
    for date in [start, end] {
        if !series.covers(date) {
            return Err(PipelineError::OutOfRange {
                date,
                domain: series.date_bounds(),
            });
        }
    }
    Ok(())
}

fn select(series: &Series, start: NaiveDate, end: NaiveDate, metrics: MetricSet) -> FilteredWindow<'_> {
    let records = series.records();
    let lo = records.partition_point(|r| r.date < start);
    let hi = records.partition_point(|r| r.date <= end);
    debug!(%start, %end, rows = hi - lo, metrics = metrics.len(), "filtered window");
    FilteredWindow {
        records: &records[lo..hi],
        metrics,
        start,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::derive;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn sample() -> Series {
        derive(&Series::from_sorted(vec![
            DailyRecord::new(d(1), 10, 1, 5),
            DailyRecord::new(d(2), 15, 2, 8),
            DailyRecord::new(d(3), 0, 0, 0),
            DailyRecord::new(d(6), 30, 3, 20),
            DailyRecord::new(d(7), 35, 3, 25),
        ]))
    }

    #[test]
    fn selects_inclusive_window_in_order() {
        let s = sample();
        let w = filter(&s, d(2), d(6), &["cases"]).unwrap();
        let dates: Vec<_> = w.records().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2), d(3), d(6)]);
    }

    #[test]
    fn full_range_with_all_metrics_reproduces_records() {
        let s = sample();
        let names: Vec<&str> = Metric::ALL.iter().map(|m| m.name()).collect();
        let w = filter(&s, d(1), d(7), &names).unwrap();
        assert_eq!(w.records(), s.records());
        for (row, rec) in w.rows().iter().zip(s.iter()) {
            assert_eq!(row.date, rec.date);
            for m in Metric::ALL {
                assert_eq!(row.get(m), Some(rec.value(m)));
            }
        }
    }

    #[test]
    fn rows_only_carry_requested_columns() {
        let s = sample();
        let w = filter(&s, d(1), d(3), &["mortality_rate", "deaths"]).unwrap();
        let row = &w.rows()[2];
        assert_eq!(row.get(Metric::Deaths), Some(MetricValue::Count(0)));
        assert_eq!(row.get(Metric::MortalityRate), Some(MetricValue::Undefined));
        assert_eq!(row.get(Metric::Cases), None);
        assert_eq!(row.values.len(), 2);
    }

    #[test]
    fn start_after_end_is_invalid() {
        let s = sample();
        assert_eq!(
            filter(&s, d(3), d(2), &["cases"]).unwrap_err(),
            PipelineError::InvalidRange { start: d(3), end: d(2) }
        );
    }

    #[test]
    fn bounds_outside_domain_are_rejected() {
        let s = sample();
        for (start, end) in [(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(), d(2)), (d(2), d(8))] {
            assert!(matches!(
                filter(&s, start, end, &["cases"]),
                Err(PipelineError::OutOfRange { domain: Some((lo, hi)), .. }) if lo == d(1) && hi == d(7)
            ));
        }
        let empty = Series::default();
        assert!(matches!(
            filter(&empty, d(1), d(1), &["cases"]),
            Err(PipelineError::OutOfRange { domain: None, .. })
        ));
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let s = sample();
        assert_eq!(
            filter(&s, d(1), d(2), &["cases", "active"]).unwrap_err(),
            PipelineError::UnknownMetric("active".to_string())
        );
    }

    #[test]
    fn gap_inside_domain_gives_empty_window() {
        let s = sample();
        let w = filter(&s, d(4), d(5), &["cases"]).unwrap();
        assert!(w.is_empty());
        assert!(w.rows().is_empty());
    }

    #[test]
    fn column_skips_undefined_cells() {
        let s = sample();
        let w = filter_metrics(&s, d(1), d(7), MetricSet::all()).unwrap();
        let col = w.column(Metric::RecoveryRate);
        assert_eq!(col.len(), 4);
        assert!(col.iter().all(|(date, _)| *date != d(3)));
    }
}
