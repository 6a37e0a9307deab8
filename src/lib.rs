//! `covid-trends` library crate.
//!
//! The binary (`covid`) is a thin wrapper around this library so that:
//!
//! - the ingest/derive/filter pipeline is testable without spawning processes
//! - the text commands and the TUI share one code path

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod tui;
