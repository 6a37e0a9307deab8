//! Derived metrics and windowed views over the canonical series.
//!
//! - `derive`: rates and day-over-day deltas
//! - `filter`: date-range + metric-column selection

pub mod derive;
pub mod filter;

pub use derive::*;
pub use filter::*;
