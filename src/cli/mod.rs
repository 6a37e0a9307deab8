//! Command-line parsing for the COVID-19 trends dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covid", version, about = "COVID-19 trends dashboard (disease.sh historical feed)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print headline totals, ingest diagnostics and the selected window as a table.
    Summary(ViewArgs),
    /// Print an ASCII trend plot of the selected window.
    Plot(ViewArgs),
    /// Write the selected window (CSV) and/or its headline summary (JSON).
    Export(ExportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same snapshot/filter pipeline as the text commands, but
    /// renders results in a terminal UI using Ratatui.
    Tui(ViewArgs),
}

/// Feed source + window selection shared by every command.
#[derive(Debug, Parser, Clone)]
pub struct ViewArgs {
    /// Read the feed from a saved JSON file instead of fetching it.
    #[arg(short = 'i', long, value_name = "JSON", conflicts_with = "url")]
    pub input: Option<PathBuf>,

    /// Feed URL (defaults to $COVID_FEED_URL, then the public disease.sh endpoint).
    #[arg(long)]
    pub url: Option<String>,

    /// First day of the window (YYYY-MM-DD). Defaults to the first available day.
    #[arg(short = 's', long, value_parser = parse_iso_date)]
    pub start: Option<NaiveDate>,

    /// Last day of the window (YYYY-MM-DD). Defaults to the last available day.
    #[arg(short = 'e', long, value_parser = parse_iso_date)]
    pub end: Option<NaiveDate>,

    /// Metrics to display: cases, deaths, recovered, recovery_rate, mortality_rate.
    #[arg(
        short = 'm',
        long,
        value_delimiter = ',',
        default_values = ["cases", "deaths", "recovered"]
    )]
    pub metrics: Vec<String>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows per panel).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for `covid export`.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Write the window (date + selected metrics) to CSV.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Write the headline summary to JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

fn parse_iso_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_split_on_commas_and_default() {
        let cli = Cli::parse_from(["covid", "summary", "-m", "cases,recovery_rate"]);
        let Command::Summary(args) = cli.command else { panic!("expected summary") };
        assert_eq!(args.metrics, vec!["cases", "recovery_rate"]);

        let cli = Cli::parse_from(["covid", "plot"]);
        let Command::Plot(args) = cli.command else { panic!("expected plot") };
        assert_eq!(args.metrics, vec!["cases", "deaths", "recovered"]);
        assert_eq!(args.start, None);
    }

    #[test]
    fn dates_are_iso() {
        let cli = Cli::parse_from(["covid", "summary", "--start", "2021-01-02"]);
        let Command::Summary(args) = cli.command else { panic!("expected summary") };
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2021, 1, 2));
        assert!(Cli::try_parse_from(["covid", "summary", "--start", "1/2/21"]).is_err());
    }

    #[test]
    fn input_and_url_conflict() {
        assert!(Cli::try_parse_from(["covid", "summary", "-i", "feed.json", "--url", "http://x"]).is_err());
    }
}
