//! `tracing` subscriber setup.
//!
//! Verbosity comes from `COVID_LOG` (an `EnvFilter` directive such as `info`
//! or `covid_trends=debug`). Text commands log to stderr; the TUI owns the
//! terminal, so it only logs to a file and only when `COVID_LOG` is set.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

pub const LOG_ENV: &str = "COVID_LOG";

/// Log file used by the TUI.
pub const TUI_LOG_FILE: &str = "covid-trends.log";

/// Log to stderr at `COVID_LOG` (default `warn`).
pub fn init_stderr() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to `path` if `COVID_LOG` is set; otherwise stay silent.
pub fn init_file(path: &Path) -> Result<(), AppError> {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return Ok(());
    };
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create log file '{}': {e}", path.display())))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
