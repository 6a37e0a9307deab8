//! Error types.
//!
//! - `PipelineError`: typed failures of the derivation pipeline (normalize,
//!   derive, filter, summarize). The display layer matches on these to show a
//!   specific message.
//! - `AppError`: what the binary reports (message + process exit code).

use chrono::NaiveDate;
use thiserror::Error;

/// Typed failures of the derivation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A feed date label did not match `month/day/2-digit-year`.
    ///
    /// The normalizer recovers from this locally (the label is dropped and
    /// counted), so callers normally only see it inside an ingest report.
    #[error("unparseable date label '{label}' (expected M/D/YY)")]
    Parse { label: String },

    /// The raw feed does not have the expected shape.
    #[error("feed schema error: {0}")]
    Schema(String),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A bound lies outside the series' dates (or the series is empty).
    #[error("{}", out_of_range_message(*date, *domain))]
    OutOfRange {
        date: NaiveDate,
        domain: Option<(NaiveDate, NaiveDate)>,
    },

    #[error(
        "unknown metric '{0}' (expected one of: cases, deaths, recovered, recovery_rate, mortality_rate)"
    )]
    UnknownMetric(String),

    #[error("no data for the selected window")]
    EmptySeries,
}

fn out_of_range_message(date: NaiveDate, domain: Option<(NaiveDate, NaiveDate)>) -> String {
    match domain {
        Some((min, max)) => format!("date {date} is outside the available data ({min} to {max})"),
        None => format!("date {date} is outside the available data (series is empty)"),
    }
}

impl PipelineError {
    /// Process exit code used when this error ends a CLI run.
    ///
    /// - 2: correctable input (dates, metric names)
    /// - 3: no usable data for the selection
    /// - 4: data unavailable (feed shape)
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InvalidRange { .. }
            | PipelineError::OutOfRange { .. }
            | PipelineError::UnknownMetric(_) => 2,
            PipelineError::Parse { .. } | PipelineError::EmptySeries => 3,
            PipelineError::Schema(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

/// Exit code for local file failures (export files, log file).
pub const EXIT_IO: u8 = 5;

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// A local file could not be created or written.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_IO, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = match &err {
            PipelineError::Schema(_) => format!("Data unavailable: {err}"),
            _ => err.to_string(),
        };
        AppError::new(err.exit_code(), message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
