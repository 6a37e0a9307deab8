//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - loads the feed snapshot
//! - filters the requested window and summarizes it
//! - prints reports/plots or writes exports

use std::path::PathBuf;

use clap::Parser;

use crate::app::pipeline::{Snapshot, load_snapshot};
use crate::cli::{Command, ExportArgs, ViewArgs};
use crate::data::feed_url_from_env;
use crate::domain::{DashboardConfig, FeedSource};
use crate::error::AppError;
use crate::metrics::FilteredWindow;

pub mod pipeline;

/// Entry point for the `covid` binary.
pub fn run() -> Result<(), AppError> {
    // We want `covid` and `covid --start 2021-01-01` to behave like `covid tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    if let Command::Tui(args) = &cli.command {
        crate::logging::init_file(&PathBuf::from(crate::logging::TUI_LOG_FILE))?;
        return crate::tui::run(config_from_args(args));
    }

    crate::logging::init_stderr();
    match cli.command {
        Command::Summary(args) => handle_summary(&config_from_args(&args)),
        Command::Plot(args) => handle_plot(&config_from_args(&args)),
        Command::Export(args) => handle_export(&args),
        Command::Tui(args) => crate::tui::run(config_from_args(&args)),
    }
}

fn handle_summary(config: &DashboardConfig) -> Result<(), AppError> {
    let snapshot = load_snapshot(&config.source)?;
    let window = select(&snapshot, config)?;

    println!("{}", crate::report::format_ingest_report(&snapshot.ingest, &snapshot.series, &window));
    let summary = window.summarize()?;
    println!("{}", crate::report::format_headline(&summary));
    println!("{}", crate::report::format_window_table(&window));
    Ok(())
}

fn handle_plot(config: &DashboardConfig) -> Result<(), AppError> {
    let snapshot = load_snapshot(&config.source)?;
    let window = select(&snapshot, config)?;

    let plot = crate::plot::render_ascii_plot(&window, config.plot_width, config.plot_height);
    println!("{plot}");
    Ok(())
}

fn handle_export(args: &ExportArgs) -> Result<(), AppError> {
    let mut config = config_from_args(&args.view);
    config.export_csv = args.csv.clone();
    config.export_json = args.json.clone();

    if config.export_csv.is_none() && config.export_json.is_none() {
        return Err(AppError::new(2, "Nothing to export: pass --csv and/or --json."));
    }

    let snapshot = load_snapshot(&config.source)?;
    export_window(&snapshot, &config)
}

/// Write the requested export files for one selection.
///
/// Everything that can fail on the data side runs before the first file is
/// created, so a failed export leaves nothing behind.
fn export_window(snapshot: &Snapshot, config: &DashboardConfig) -> Result<(), AppError> {
    let window = select(snapshot, config)?;
    let summary = match &config.export_json {
        Some(_) => Some(window.summarize()?),
        None => None,
    };

    if let Some(path) = &config.export_csv {
        crate::io::export::write_window_csv(path, &window)?;
        println!("Wrote {} rows to {}", window.len(), path.display());
    }
    if let (Some(path), Some(summary)) = (&config.export_json, &summary) {
        crate::io::export::write_summary_json(path, summary, &window)?;
        println!("Wrote summary to {}", path.display());
    }

    Ok(())
}

/// Clamp the requested window into the data and filter it.
fn select<'a>(snapshot: &'a Snapshot, config: &DashboardConfig) -> Result<FilteredWindow<'a>, AppError> {
    let (start, end) = snapshot.resolve_window(config.start, config.end)?;
    Ok(snapshot.view(start, end, &config.metrics)?)
}

pub fn config_from_args(args: &ViewArgs) -> DashboardConfig {
    let source = match (&args.input, &args.url) {
        (Some(path), _) => FeedSource::File(path.clone()),
        (None, Some(url)) => FeedSource::Url(url.clone()),
        (None, None) => FeedSource::Url(feed_url_from_env()),
    };

    DashboardConfig {
        source,
        start: args.start,
        end: args.end,
        metrics: args.metrics.clone(),
        plot_width: args.width,
        plot_height: args.height,
        export_csv: None,
        export_json: None,
    }
}

/// Rewrite argv so `covid` defaults to `covid tui`.
///
/// Rules:
/// - `covid`                          -> `covid tui`
/// - `covid --start 2021-01-01 ...`   -> `covid tui --start 2021-01-01 ...`
/// - `covid --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "summary" | "plot" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_launches_tui() {
        assert_eq!(rewrite_args(argv(&["covid"])), argv(&["covid", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["covid", "-s", "2021-01-01"])),
            argv(&["covid", "tui", "-s", "2021-01-01"])
        );
        assert_eq!(rewrite_args(argv(&["covid", "--help"])), argv(&["covid", "--help"]));
        assert_eq!(rewrite_args(argv(&["covid", "plot"])), argv(&["covid", "plot"]));
    }

    #[test]
    fn input_file_wins_over_url() {
        let cli = crate::cli::Cli::parse_from(["covid", "summary", "-i", "feed.json"]);
        let Command::Summary(args) = cli.command else { panic!("expected summary") };
        let config = config_from_args(&args);
        assert_eq!(config.source, FeedSource::File(PathBuf::from("feed.json")));
    }

    fn fixture_export_config(day: u32, tag: &str) -> (Snapshot, DashboardConfig) {
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/sample_feed.json");
        let snapshot = load_snapshot(&FeedSource::File(fixture.clone())).unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
        let dir = std::env::temp_dir();
        let stem = format!("covid-trends-{tag}-{}", std::process::id());
        let config = DashboardConfig {
            source: FeedSource::File(fixture),
            start: Some(date),
            end: Some(date),
            metrics: vec!["cases".to_string()],
            plot_width: 100,
            plot_height: 20,
            export_csv: Some(dir.join(format!("{stem}.csv"))),
            export_json: Some(dir.join(format!("{stem}.json"))),
        };
        (snapshot, config)
    }

    #[test]
    fn empty_window_export_writes_nothing() {
        // 2020-01-26 is inside the fixture's range but has no record.
        let (snapshot, config) = fixture_export_config(26, "gap");
        let err = export_window(&snapshot, &config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(!config.export_csv.as_ref().unwrap().exists());
        assert!(!config.export_json.as_ref().unwrap().exists());
    }

    #[test]
    fn export_writes_both_files() {
        let (snapshot, config) = fixture_export_config(24, "day");
        export_window(&snapshot, &config).unwrap();
        let csv_path = config.export_csv.as_ref().unwrap();
        let json_path = config.export_json.as_ref().unwrap();
        let csv = std::fs::read_to_string(csv_path).unwrap();
        let json = std::fs::read_to_string(json_path).unwrap();
        let _ = std::fs::remove_file(csv_path);
        let _ = std::fs::remove_file(json_path);
        assert_eq!(csv, "date,cases\n2020-01-24,15\n");
        assert!(json.contains("\"rows\": 1"));
    }

    #[test]
    fn unwritable_export_path_is_an_io_error() {
        let (snapshot, mut config) = fixture_export_config(24, "io");
        config.export_csv = Some(std::env::temp_dir().join("covid-trends-missing-dir").join("out.csv"));
        config.export_json = None;
        let err = export_window(&snapshot, &config).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_IO);
    }
}
