//! Logging setup.
//!
//! Two layers: a compact stderr layer filtered by `RUST_LOG` (default
//! `info`), and a daily rolling file under the log directory that always
//! records `debug` for this crate.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Log file name prefix; files are named `swcatalog.<date>.log`.
pub const LOG_FILE_PREFIX: &str = "swcatalog";

/// Number of rotated log files kept.
pub const MAX_LOG_FILES: usize = 5;

/// Filter for the stderr layer when `RUST_LOG` is not set.
const DEFAULT_CONSOLE_FILTER: &str = "info";

/// Filter for the file layer.
const FILE_FILTER: &str = "info,swcatalog=debug";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file in {}: {reason}", path.display())]
    Appender { path: PathBuf, reason: String },

    #[error("a global logger is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Keeps the file writer alive; logs are flushed when it is dropped.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    _file: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// Directory the log files are written to.
    pub fn log_dir(&self) -> &Path {
        &self.path
    }
}

/// Build the rolling file appender for `dir`, creating the directory.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|e| LoggingError::Appender {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Install the global subscriber. `verbose` lowers the stderr default to
/// `debug`; `RUST_LOG` still wins when set.
pub fn init_logging(log_dir: &Path, verbose: bool) -> Result<LoggingGuard, LoggingError> {
    let appender = file_appender(log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default = if verbose { "debug" } else { DEFAULT_CONSOLE_FILTER };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_timer(LocalTime::rfc_3339())
        .compact()
        .with_filter(console_filter);

    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_timer(LocalTime::rfc_3339())
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    tracing::debug!(dir = %log_dir.display(), "Logging initialized");
    Ok(LoggingGuard {
        _file: guard,
        path: log_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_file_appender_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("logs");

        let mut appender = file_appender(&dir).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("swcatalog."));
        assert!(names[0].ends_with(".log"));
    }

    #[test]
    fn test_file_appender_rejects_file_as_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            file_appender(&file),
            Err(LoggingError::CreateDir { .. })
        ));
    }
}
