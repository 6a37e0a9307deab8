//! Headline aggregation over a filtered window.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{DailyDelta, DailyRecord};
use crate::error::PipelineError;

/// Cumulative totals of the last record in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,
}

/// Headline numbers: latest totals and the latest day-over-day change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Date of the last record in the window.
    pub date: NaiveDate,
    pub totals: Totals,
    /// `None` when the window holds a single record.
    pub daily: Option<DailyDelta>,
}

impl Summary {
    /// Deltas with "no prior value" shown as zero (display convention).
    pub fn daily_or_zero(&self) -> DailyDelta {
        self.daily.unwrap_or(DailyDelta {
            cases: 0,
            deaths: 0,
            recovered: 0,
        })
    }
}

/// Summarize a window of records.
///
/// Deltas are recomputed inside the window: the last record against the one
/// right before it in `records`, not the full-history delta stored on the
/// record. At the left edge of a selection the two can differ.
pub fn summarize(records: &[DailyRecord]) -> Result<Summary, PipelineError> {
    let (last, rest) = records.split_last().ok_or(PipelineError::EmptySeries)?;
    Ok(Summary {
        date: last.date,
        totals: Totals {
            cases: last.cases,
            deaths: last.deaths,
            recovered: last.recovered,
        },
        daily: rest.last().map(|prev| DailyDelta::between(prev, last)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;
    use crate::metrics::{derive, filter};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn sample() -> Series {
        derive(&Series::from_sorted(vec![
            DailyRecord::new(d(1), 10, 1, 5),
            DailyRecord::new(d(2), 15, 2, 8),
            DailyRecord::new(d(4), 40, 4, 30),
            DailyRecord::new(d(5), 38, 4, 31),
        ]))
    }

    #[test]
    fn empty_window_is_an_error() {
        assert_eq!(summarize(&[]), Err(PipelineError::EmptySeries));
    }

    #[test]
    fn totals_match_last_record_of_every_window() {
        let s = sample();
        let dates: Vec<NaiveDate> = s.iter().map(|r| r.date).collect();
        for (i, &start) in dates.iter().enumerate() {
            for &end in &dates[i..] {
                let w = filter(&s, start, end, &["cases"]).unwrap();
                let summary = w.summarize().unwrap();
                let last = w.records().last().unwrap();
                assert_eq!(summary.date, last.date);
                assert_eq!(
                    (summary.totals.cases, summary.totals.deaths, summary.totals.recovered),
                    (last.cases, last.deaths, last.recovered)
                );
            }
        }
    }

    #[test]
    fn two_day_window() {
        let s = sample();
        let summary = filter(&s, d(1), d(2), &["cases"]).unwrap().summarize().unwrap();
        assert_eq!(summary.totals, Totals { cases: 15, deaths: 2, recovered: 8 });
        assert_eq!(summary.daily, Some(DailyDelta { cases: 5, deaths: 1, recovered: 3 }));
    }

    #[test]
    fn single_record_window_has_no_prior_value() {
        let s = sample();
        let summary = filter(&s, d(2), d(3), &["cases"]).unwrap().summarize().unwrap();
        assert_eq!(summary.date, d(2));
        assert_eq!(summary.daily, None);
        assert_eq!(summary.daily_or_zero(), DailyDelta { cases: 0, deaths: 0, recovered: 0 });
        // The full-history delta on that record is still available.
        assert_eq!(s.get(d(2)).unwrap().daily_cases(), Some(5));
    }

    #[test]
    fn negative_latest_delta_passes_through() {
        let s = sample();
        let summary = filter(&s, d(1), d(5), &["cases"]).unwrap().summarize().unwrap();
        assert_eq!(summary.daily, Some(DailyDelta { cases: -2, deaths: 0, recovered: 1 }));
    }

    #[test]
    fn empty_filtered_window_reports_empty_series() {
        let s = sample();
        let w = filter(&s, d(3), d(3), &["cases"]).unwrap();
        assert_eq!(w.summarize(), Err(PipelineError::EmptySeries));
    }
}
