//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the pipeline
//! - exported to JSON/CSV
//! - rendered by the report, plot and TUI front-ends

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A selectable column of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cases,
    Deaths,
    Recovered,
    RecoveryRate,
    MortalityRate,
}

/// Which chart axis a metric is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricAxis {
    /// Cumulative counts.
    Count,
    /// Percentages.
    Percent,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Cases,
        Metric::Deaths,
        Metric::Recovered,
        Metric::RecoveryRate,
        Metric::MortalityRate,
    ];

    /// Feed / CLI name.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
            Metric::Recovered => "recovered",
            Metric::RecoveryRate => "recovery_rate",
            Metric::MortalityRate => "mortality_rate",
        }
    }

    /// Human-readable label for charts and tables.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Cases => "Cases",
            Metric::Deaths => "Deaths",
            Metric::Recovered => "Recovered",
            Metric::RecoveryRate => "Recovery Rate (%)",
            Metric::MortalityRate => "Mortality Rate (%)",
        }
    }

    pub fn axis(self) -> MetricAxis {
        match self {
            Metric::Cases | Metric::Deaths | Metric::Recovered => MetricAxis::Count,
            Metric::RecoveryRate | Metric::MortalityRate => MetricAxis::Percent,
        }
    }

    /// Position in `Metric::ALL` (used by `MetricSet`).
    fn bit(self) -> u8 {
        match self {
            Metric::Cases => 1 << 0,
            Metric::Deaths => 1 << 1,
            Metric::Recovered => 1 << 2,
            Metric::RecoveryRate => 1 << 3,
            Metric::MortalityRate => 1 << 4,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == needle)
            .ok_or_else(|| PipelineError::UnknownMetric(needle.to_string()))
    }
}

/// An unordered set of metrics, iterated in `Metric::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricSet(u8);

impl MetricSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Metric::ALL.into_iter().collect()
    }

    /// Parse metric names. Duplicates collapse; unknown names fail.
    pub fn parse<I, S>(names: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        for name in names {
            set.insert(name.as_ref().parse()?);
        }
        Ok(set)
    }

    pub fn contains(self, metric: Metric) -> bool {
        self.0 & metric.bit() != 0
    }

    pub fn insert(&mut self, metric: Metric) {
        self.0 |= metric.bit();
    }

    /// Flip membership; returns whether the metric is now selected.
    pub fn toggle(&mut self, metric: Metric) -> bool {
        self.0 ^= metric.bit();
        self.contains(metric)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Metric> {
        Metric::ALL.into_iter().filter(move |m| self.contains(*m))
    }
}

impl FromIterator<Metric> for MetricSet {
    fn from_iter<T: IntoIterator<Item = Metric>>(iter: T) -> Self {
        let mut set = MetricSet::empty();
        for m in iter {
            set.insert(m);
        }
        set
    }
}

/// A single cell of a filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Rate(f64),
    /// A derived value with no defined result (e.g. a rate when `cases == 0`).
    Undefined,
}

impl MetricValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            MetricValue::Count(v) => Some(v as f64),
            MetricValue::Rate(v) => Some(v),
            MetricValue::Undefined => None,
        }
    }
}

/// Day-over-day change of the three cumulative counts.
///
/// Negative values are data corrections and are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDelta {
    pub cases: i64,
    pub deaths: i64,
    pub recovered: i64,
}

impl DailyDelta {
    /// `current - previous` for each count.
    pub fn between(previous: &DailyRecord, current: &DailyRecord) -> Self {
        Self {
            cases: diff(previous.cases, current.cases),
            deaths: diff(previous.deaths, current.deaths),
            recovered: diff(previous.recovered, current.recovered),
        }
    }
}

// Counts are validated to fit in i64 at ingest.
fn diff(previous: u64, current: u64) -> i64 {
    current as i64 - previous as i64
}

/// One calendar day of the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,

    /// Cumulative counts as delivered by the feed.
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,

    /// Percentages rounded to 2 decimals; `None` when `cases == 0`.
    pub recovery_rate: Option<f64>,
    pub mortality_rate: Option<f64>,

    /// Change against the preceding record; `None` when there is none.
    pub daily: Option<DailyDelta>,
}

impl DailyRecord {
    /// A record with only the cumulative counts set.
    pub fn new(date: NaiveDate, cases: u64, deaths: u64, recovered: u64) -> Self {
        Self {
            date,
            cases,
            deaths,
            recovered,
            recovery_rate: None,
            mortality_rate: None,
            daily: None,
        }
    }

    pub fn value(&self, metric: Metric) -> MetricValue {
        let rate = |r: Option<f64>| r.map(MetricValue::Rate).unwrap_or(MetricValue::Undefined);
        match metric {
            Metric::Cases => MetricValue::Count(self.cases),
            Metric::Deaths => MetricValue::Count(self.deaths),
            Metric::Recovered => MetricValue::Count(self.recovered),
            Metric::RecoveryRate => rate(self.recovery_rate),
            Metric::MortalityRate => rate(self.mortality_rate),
        }
    }

    pub fn daily_cases(&self) -> Option<i64> {
        self.daily.map(|d| d.cases)
    }

    pub fn daily_deaths(&self) -> Option<i64> {
        self.daily.map(|d| d.deaths)
    }

    pub fn daily_recovered(&self) -> Option<i64> {
        self.daily.map(|d| d.recovered)
    }
}

/// Where the raw feed comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Url(String),
    File(PathBuf),
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags plus environment (`COVID_FEED_URL`).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: FeedSource,
    /// Requested window; `None` means the first/last available date.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Metric names exactly as requested (validated by the filter).
    pub metrics: Vec<String>,

    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_round_trip_through_from_str() {
        for m in Metric::ALL {
            assert_eq!(m.name().parse::<Metric>().unwrap(), m);
        }
        assert_eq!(
            "active".parse::<Metric>(),
            Err(PipelineError::UnknownMetric("active".to_string()))
        );
    }

    #[test]
    fn metric_set_dedups_and_iterates_in_canonical_order() {
        let set = MetricSet::parse(["mortality_rate", "cases", "cases"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Metric::Cases, Metric::MortalityRate]);
    }

    #[test]
    fn metric_set_toggle() {
        let mut set = MetricSet::empty();
        assert!(set.toggle(Metric::Deaths));
        assert!(!set.toggle(Metric::Deaths));
        assert!(set.is_empty());
    }

    #[test]
    fn delta_keeps_corrections_negative() {
        let d = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let prev = DailyRecord::new(d, 100, 10, 50);
        let cur = DailyRecord::new(d.succ_opt().unwrap(), 90, 12, 50);
        let delta = DailyDelta::between(&prev, &cur);
        assert_eq!(delta, DailyDelta { cases: -10, deaths: 2, recovered: 0 });
    }

    #[test]
    fn undefined_rate_is_not_zero() {
        let d = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let rec = DailyRecord::new(d, 0, 0, 0);
        assert_eq!(rec.value(Metric::RecoveryRate), MetricValue::Undefined);
        assert_eq!(rec.value(Metric::Cases), MetricValue::Count(0));
    }
}
