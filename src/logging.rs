use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{FilingsError, Result};
use crate::settings::config_dir;

pub fn log_path() -> PathBuf {
    config_dir().join("filings.log")
}

/// Send `tracing` output to the log file. The terminal belongs to the UI,
/// so nothing is written to stdout or stderr.
///
/// `RUST_LOG` wins over `level`; `verbose` wins over both.
pub fn init(level: &str, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let path = log_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| FilingsError::Other(format!("could not start logging: {e}")))
}
