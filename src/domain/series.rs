//! The canonical per-day table.

use chrono::NaiveDate;

use super::DailyRecord;

/// Records sorted ascending by date, at most one per date.
///
/// The record vector is private: a `Series` is only produced by the normalizer
/// and the deriver, and is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    records: Vec<DailyRecord>,
}

impl Series {
    /// Wrap records that are already strictly increasing by date.
    pub(crate) fn from_sorted(records: Vec<DailyRecord>) -> Self {
        debug_assert!(
            records.windows(2).all(|w| w[0].date < w[1].date),
            "series dates must be strictly increasing"
        );
        Self { records }
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&DailyRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&DailyRecord> {
        self.records.last()
    }

    /// `(first date, last date)`, or `None` for an empty series.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first()?.date, self.last()?.date))
    }

    /// Whether `date` lies within `date_bounds()` (inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_bounds()
            .is_some_and(|(min, max)| min <= date && date <= max)
    }

    /// Clamp a date into the series' domain.
    ///
    /// This is the caller-side policy of the date pickers; the range filter
    /// itself rejects out-of-domain bounds.
    pub fn clamp(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.date_bounds().map(|(min, max)| date.clamp(min, max))
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a DailyRecord;
    type IntoIter = std::slice::Iter<'a, DailyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn series(days: &[u32]) -> Series {
        Series::from_sorted(days.iter().map(|&day| DailyRecord::new(d(day), 1, 0, 0)).collect())
    }

    #[test]
    fn clamp_pins_dates_to_domain() {
        let s = series(&[5, 6, 9]);
        assert_eq!(s.clamp(d(1)), Some(d(5)));
        assert_eq!(s.clamp(d(7)), Some(d(7)));
        assert_eq!(s.clamp(d(20)), Some(d(9)));
        assert_eq!(Series::default().clamp(d(1)), None);
    }

    #[test]
    fn covers_and_get() {
        let s = series(&[5, 6, 9]);
        assert!(s.covers(d(7)));
        assert!(!s.covers(d(10)));
        assert!(s.get(d(7)).is_none());
        assert_eq!(s.get(d(9)).map(|r| r.date), Some(d(9)));
    }
}
