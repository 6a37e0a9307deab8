//! Feed ingest and normalization.
//!
//! This module is responsible for turning the raw feed JSON
//! (`{cases: {label: n}, deaths: {...}, recovered: {...}}`) into a clean,
//! date-ordered `Series` of per-day records.
//!
//! Design goals:
//! - **Strict schema** for the feed shape (any deviation is a `SchemaError`)
//! - **Label-level recovery** (skip unparseable date labels, but report them)
//! - **Deterministic behavior** (input order decides duplicate resolution)
//! - **Separation of concerns**: no derived metrics here

use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::domain::{DailyRecord, Series};
use crate::error::PipelineError;

/// Date-label format used by the feed (`1/22/20`).
pub const DATE_LABEL_FORMAT: &str = "%m/%d/%y";

/// The three top-level keys of the feed, in record order.
pub const FEED_KEYS: [&str; 3] = ["cases", "deaths", "recovered"];

/// One feed label with its three cumulative counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub label: String,
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,
}

/// The feed after schema validation, labels still unparsed.
///
/// Entries keep the order in which the feed delivered them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeed {
    pub entries: Vec<RawEntry>,
}

impl RawFeed {
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| PipelineError::Schema(format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_reader(reader)
            .map_err(|e| PipelineError::Schema(format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate the feed shape and collect its entries.
    pub fn from_value(value: &Value) -> Result<Self, PipelineError> {
        let root = value.as_object().ok_or_else(|| {
            PipelineError::Schema("expected a JSON object with keys `cases`, `deaths`, `recovered`".to_string())
        })?;

        if let Some(key) = root.keys().find(|k| !FEED_KEYS.contains(&k.as_str())) {
            return Err(PipelineError::Schema(format!("unexpected key `{key}`")));
        }

        let cases = metric_map(root, "cases")?;
        let deaths = metric_map(root, "deaths")?;
        let recovered = metric_map(root, "recovered")?;

        ensure_same_labels(cases, deaths, "deaths")?;
        ensure_same_labels(cases, recovered, "recovered")?;

        let mut entries = Vec::with_capacity(cases.len());
        for (label, value) in cases {
            entries.push(RawEntry {
                label: label.clone(),
                cases: count(value, "cases", label)?,
                deaths: count(&deaths[label], "deaths", label)?,
                recovered: count(&recovered[label], "recovered", label)?,
            });
        }

        Ok(Self { entries })
    }
}

fn metric_map<'a>(root: &'a Map<String, Value>, key: &str) -> Result<&'a Map<String, Value>, PipelineError> {
    root.get(key)
        .ok_or_else(|| PipelineError::Schema(format!("missing key `{key}`")))?
        .as_object()
        .ok_or_else(|| PipelineError::Schema(format!("`{key}` must map date labels to counts")))
}

fn ensure_same_labels(
    cases: &Map<String, Value>,
    other: &Map<String, Value>,
    other_key: &str,
) -> Result<(), PipelineError> {
    let mismatch = cases.len() != other.len() || cases.keys().any(|label| !other.contains_key(label));
    if mismatch {
        return Err(PipelineError::Schema(format!(
            "date labels of `{other_key}` differ from those of `cases`"
        )));
    }
    Ok(())
}

/// A non-negative integer that fits in `i64` (so deltas cannot overflow).
///
/// Integral floats (`15.0`) are accepted; some feed mirrors emit them.
fn count(value: &Value, key: &str, label: &str) -> Result<u64, PipelineError> {
    let parsed = match value.as_u64() {
        Some(v) => Some(v),
        None => value
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= i64::MAX as f64)
            .map(|v| v as u64),
    };
    parsed
        .filter(|v| *v <= i64::MAX as u64)
        .ok_or_else(|| {
            PipelineError::Schema(format!(
                "`{key}` value for '{label}' must be a non-negative integer, got {value}"
            ))
        })
}

/// Parse a feed date label (`M/D/YY`). Surrounding whitespace is not allowed.
pub fn parse_date_label(label: &str) -> Result<NaiveDate, PipelineError> {
    let parse_error = || PipelineError::Parse {
        label: label.to_string(),
    };
    // Labels are exact; padding makes them malformed.
    if label.trim() != label {
        return Err(parse_error());
    }
    NaiveDate::parse_from_str(label, DATE_LABEL_FORMAT).map_err(|_| parse_error())
}

/// A label the normalizer skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedLabel {
    pub label: String,
    pub error: PipelineError,
}

/// What happened to the raw labels during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub dropped: Vec<DroppedLabel>,
    /// Dates that more than one label mapped to (the later label won).
    pub duplicate_dates: Vec<NaiveDate>,
    pub labels_read: usize,
    pub labels_used: usize,
}

impl IngestReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Normalizer output: the base series (counts only) and its report.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedSeries {
    pub series: Series,
    pub report: IngestReport,
}

/// Validate and normalize a feed JSON value in one step.
pub fn ingest_value(value: &Value) -> Result<IngestedSeries, PipelineError> {
    Ok(normalize(&RawFeed::from_value(value)?))
}

/// Build the canonical series from a validated feed.
///
/// Unparseable labels are dropped and reported. When two labels land on the
/// same date, the one delivered later wins.
pub fn normalize(raw: &RawFeed) -> IngestedSeries {
    let mut by_date: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();
    let mut dropped = Vec::new();
    let mut duplicate_dates = Vec::new();

    for entry in &raw.entries {
        let date = match parse_date_label(&entry.label) {
            Ok(d) => d,
            Err(error) => {
                warn!(label = %entry.label, "dropping unparseable date label");
                dropped.push(DroppedLabel {
                    label: entry.label.clone(),
                    error,
                });
                continue;
            }
        };

        let record = DailyRecord::new(date, entry.cases, entry.deaths, entry.recovered);
        if by_date.insert(date, record).is_some() {
            warn!(%date, label = %entry.label, "duplicate date in feed; keeping the later value");
            duplicate_dates.push(date);
        }
    }

    let records: Vec<DailyRecord> = by_date.into_values().collect();
    let labels_used = records.len();

    info!(
        labels_read = raw.entries.len(),
        labels_used,
        dropped = dropped.len(),
        duplicates = duplicate_dates.len(),
        "normalized feed"
    );

    IngestedSeries {
        series: Series::from_sorted(records),
        report: IngestReport {
            dropped,
            duplicate_dates,
            labels_read: raw.entries.len(),
            labels_used,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_feed_labels() {
        assert_eq!(parse_date_label("1/22/20").unwrap(), d(2020, 1, 22));
        assert_eq!(parse_date_label("12/31/21").unwrap(), d(2021, 12, 31));
        assert_eq!(parse_date_label("03/09/23").unwrap(), d(2023, 3, 9));
    }

    #[test]
    fn rejects_labels_in_other_formats() {
        for label in ["13/40/21", "2021-01-02", "1/2/2021", "", "today", " 1/2/21 ", "1/2/21 ", " 1/2/21"] {
            assert!(
                matches!(parse_date_label(label), Err(PipelineError::Parse { .. })),
                "label {label:?} should not parse"
            );
        }
    }

    #[test]
    fn normalizes_two_day_feed() {
        let value = json!({
            "cases": {"1/1/21": 10, "1/2/21": 15},
            "deaths": {"1/1/21": 1, "1/2/21": 2},
            "recovered": {"1/1/21": 5, "1/2/21": 8}
        });
        let ingest = ingest_value(&value).unwrap();
        assert_eq!(ingest.series.len(), 2);
        assert_eq!(ingest.report.labels_read, 2);
        assert_eq!(ingest.report.labels_used, 2);

        let day2 = &ingest.series.records()[1];
        assert_eq!(day2.date, d(2021, 1, 2));
        assert_eq!((day2.cases, day2.deaths, day2.recovered), (15, 2, 8));
        assert_eq!(day2.recovery_rate, None);
        assert_eq!(day2.daily, None);
    }

    #[test]
    fn drops_bad_label_and_keeps_the_rest() {
        let value = json!({
            "cases": {"1/1/21": 10, "13/40/21": 99, "1/2/21": 15},
            "deaths": {"1/1/21": 1, "13/40/21": 9, "1/2/21": 2},
            "recovered": {"1/1/21": 5, "13/40/21": 9, "1/2/21": 8}
        });
        let ingest = ingest_value(&value).unwrap();
        assert_eq!(ingest.report.dropped_count(), 1);
        assert_eq!(ingest.report.dropped[0].label, "13/40/21");
        assert_eq!(ingest.series.len(), 2);
        assert_eq!(ingest.report.labels_read, 3);
    }

    #[test]
    fn padded_label_is_dropped_not_trimmed() {
        let value = json!({
            "cases": {"1/1/21": 10, " 1/2/21 ": 15},
            "deaths": {"1/1/21": 1, " 1/2/21 ": 2},
            "recovered": {"1/1/21": 5, " 1/2/21 ": 8}
        });
        let ingest = ingest_value(&value).unwrap();
        assert_eq!(ingest.series.len(), 1);
        assert_eq!(ingest.report.dropped[0].label, " 1/2/21 ");
    }

    #[test]
    fn output_is_sorted_and_unique_for_unordered_input() {
        let value = json!({
            "cases": {"3/1/21": 3, "1/1/21": 1, "2/1/21": 2, "01/01/21": 4},
            "deaths": {"3/1/21": 0, "1/1/21": 0, "2/1/21": 0, "01/01/21": 0},
            "recovered": {"3/1/21": 0, "1/1/21": 0, "2/1/21": 0, "01/01/21": 0}
        });
        let ingest = ingest_value(&value).unwrap();
        let dates: Vec<NaiveDate> = ingest.series.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2021, 1, 1), d(2021, 2, 1), d(2021, 3, 1)]);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn later_label_wins_on_duplicate_date() {
        let value = json!({
            "cases": {"1/2/21": 15, "01/02/21": 16},
            "deaths": {"1/2/21": 2, "01/02/21": 3},
            "recovered": {"1/2/21": 8, "01/02/21": 9}
        });
        let ingest = ingest_value(&value).unwrap();
        assert_eq!(ingest.series.len(), 1);
        assert_eq!(ingest.report.duplicate_dates, vec![d(2021, 1, 2)]);
        let rec = &ingest.series.records()[0];
        assert_eq!((rec.cases, rec.deaths, rec.recovered), (16, 3, 9));
    }

    #[test]
    fn accepts_integral_floats() {
        let value = json!({
            "cases": {"1/1/21": 10.0},
            "deaths": {"1/1/21": 1},
            "recovered": {"1/1/21": 0}
        });
        let ingest = ingest_value(&value).unwrap();
        assert_eq!(ingest.series.records()[0].cases, 10);
    }

    #[test]
    fn schema_violations_are_rejected() {
        let bad = [
            json!([1, 2, 3]),
            json!({"cases": {}, "deaths": {}}),
            json!({"cases": {}, "deaths": {}, "recovered": {}, "active": {}}),
            json!({"cases": [], "deaths": {}, "recovered": {}}),
            json!({"cases": {"1/1/21": -1}, "deaths": {"1/1/21": 0}, "recovered": {"1/1/21": 0}}),
            json!({"cases": {"1/1/21": 1.5}, "deaths": {"1/1/21": 0}, "recovered": {"1/1/21": 0}}),
            json!({"cases": {"1/1/21": "7"}, "deaths": {"1/1/21": 0}, "recovered": {"1/1/21": 0}}),
            json!({"cases": {"1/1/21": 1}, "deaths": {"1/2/21": 0}, "recovered": {"1/1/21": 0}}),
            json!({"cases": {"1/1/21": 1}, "deaths": {"1/1/21": 0}, "recovered": {}}),
        ];
        for value in bad {
            assert!(
                matches!(RawFeed::from_value(&value), Err(PipelineError::Schema(_))),
                "expected schema error for {value}"
            );
        }
    }

    #[test]
    fn invalid_json_is_a_schema_error() {
        assert!(matches!(RawFeed::from_json_str("{not json"), Err(PipelineError::Schema(_))));
    }
}
