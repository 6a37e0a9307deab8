//! Feed client for the historical COVID-19 time series.
//!
//! The feed is a single JSON document
//! (`{cases: {"1/22/20": n, ...}, deaths: {...}, recovered: {...}}`); this
//! module only fetches it. Shape validation belongs to `io::ingest`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::info;

use crate::domain::FeedSource;
use crate::error::AppError;

/// Global history, all days.
pub const DEFAULT_FEED_URL: &str = "https://disease.sh/v3/covid-19/historical/all?lastdays=all";

/// Environment variable overriding the feed URL (also read from `.env`).
pub const FEED_URL_ENV: &str = "COVID_FEED_URL";

pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// GET the feed and decode it as JSON.
    pub fn fetch(&self) -> Result<Value, AppError> {
        info!(url = %self.url, "fetching feed");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::new(4, format!("Data unavailable: feed request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Data unavailable: feed request failed with status {}.", resp.status()),
            ));
        }

        resp.json()
            .map_err(|e| AppError::new(4, format!("Data unavailable: failed to parse feed response: {e}")))
    }
}

/// `COVID_FEED_URL` (after loading `.env`), else `DEFAULT_FEED_URL`.
pub fn feed_url_from_env() -> String {
    dotenvy::dotenv().ok();
    std::env::var(FEED_URL_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_FEED_URL.to_string())
}

/// Read a feed document saved to disk.
pub fn read_feed_file(path: &Path) -> Result<Value, AppError> {
    info!(path = %path.display(), "reading feed file");
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open feed file '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(4, format!("Data unavailable: invalid JSON in '{}': {e}", path.display())))
}

/// Load the raw feed from wherever the config points.
pub fn load_feed(source: &FeedSource) -> Result<Value, AppError> {
    match source {
        FeedSource::Url(url) => FeedClient::new(url.clone()).fetch(),
        FeedSource::File(path) => read_feed_file(path),
    }
}
