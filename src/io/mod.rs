//! Input/output helpers.
//!
//! - feed validation + normalization (`ingest`)
//! - window/summary exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
