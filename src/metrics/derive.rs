//! Metric derivation: recovery/mortality rates and day-over-day deltas.

use tracing::debug;

use crate::domain::{DailyDelta, DailyRecord, Series};

/// `round(part / cases * 100, 2)`, or `None` when `cases == 0`.
pub fn percentage(part: u64, cases: u64) -> Option<f64> {
    if cases == 0 {
        return None;
    }
    let pct = part as f64 / cases as f64 * 100.0;
    Some(round2(pct))
}

/// `(recovery_rate, mortality_rate)` for one record's cumulative counts.
pub fn rates(record: &DailyRecord) -> (Option<f64>, Option<f64>) {
    (
        percentage(record.recovered, record.cases),
        percentage(record.deaths, record.cases),
    )
}

/// Two decimals, ties to even (`3.125` -> `3.12`).
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Populate rates and deltas, returning a new series.
///
/// Deltas are taken against the previous record in sorted order, whatever
/// the calendar gap. The first record has no prior value.
pub fn derive(series: &Series) -> Series {
    let mut out: Vec<DailyRecord> = Vec::with_capacity(series.len());
    let mut previous: Option<&DailyRecord> = None;

    for record in series {
        let (recovery_rate, mortality_rate) = rates(record);
        out.push(DailyRecord {
            recovery_rate,
            mortality_rate,
            daily: previous.map(|p| DailyDelta::between(p, record)),
            ..record.clone()
        });
        previous = Some(record);
    }

    debug!(records = out.len(), "derived rates and deltas");
    Series::from_sorted(out)
}
