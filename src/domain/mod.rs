//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - selectable metrics and their cell values (`Metric`, `MetricSet`, `MetricValue`)
//! - per-day records (`DailyRecord`, `DailyDelta`)
//! - the ordered, date-unique `Series`
//! - run configuration (`DashboardConfig`, `FeedSource`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
