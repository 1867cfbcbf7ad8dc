use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

/// Filter directive, e.g. `TARRY_LOG=debug`. Logging is off when unset.
pub const LOG_ENV: &str = "TARRY_LOG";
/// Overrides the log file location
pub const LOG_FILE_ENV: &str = "TARRY_LOG_FILE";

fn log_file_path() -> Option<PathBuf> {
    std::env::var_os(LOG_FILE_ENV)
        .map(PathBuf::from)
        .or_else(AppDirs::log_path)
}

/// Install a file-backed subscriber when `TARRY_LOG` is set. The terminal is
/// owned by the UI, so nothing is ever written to stdout or stderr. Any
/// failure leaves logging disabled.
pub fn init() -> Option<PathBuf> {
    let filter = EnvFilter::try_from_env(LOG_ENV).ok()?;
    let path = log_file_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = File::options().create(true).append(true).open(&path).ok()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_target(false)
        .try_init()
        .ok()?;

    Some(path)
}
