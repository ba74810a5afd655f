use std::{fs, path::Path, time::Duration};

use duckdb::{AccessMode, Config, Connection};
use log::warn;

use crate::utils::retry::with_retry;

/// Use this function to open a DuckDB connection.  Another process holding
/// the file lock makes the open fail, so a few attempts are made before
/// giving up.  The parent directory is created if it does not exist.
/// Suggested `max_attempts = 8`, `initial_wait = Duration::from_millis(25)`.
pub fn open_with_retry(
    duckdb_path: &str,
    max_attempts: u32,
    initial_wait: Duration,
    access_mode: AccessMode,
) -> Result<Connection, duckdb::Error> {
    if let Some(dir) = Path::new(duckdb_path).parent() {
        if !dir.as_os_str().is_empty() {
            // the open below reports the failure if the directory is really needed
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Cannot create directory {}: {}", dir.display(), e);
            }
        }
    }
    with_retry(
        max_attempts,
        initial_wait,
        |_| true,
        || {
            let config = Config::default().access_mode(same_mode(&access_mode))?;
            Connection::open_with_flags(duckdb_path, config)
        },
    )
}

/// `AccessMode` is not `Clone`, and each attempt consumes one.
fn same_mode(mode: &AccessMode) -> AccessMode {
    match mode {
        AccessMode::Automatic => AccessMode::Automatic,
        AccessMode::ReadOnly => AccessMode::ReadOnly,
        AccessMode::ReadWrite => AccessMode::ReadWrite,
    }
}
