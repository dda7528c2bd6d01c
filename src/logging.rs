//! Logging infrastructure.
//!
//! Provides structured logging with file output and console output:
//! - Writes to the configured log file (cleared on session start)
//! - Also prints to stdout for CLI tailing
//! - Configurable via RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
#[derive(Debug)]
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Creates the log directory if needed, clears the previous log file,
/// and sets up dual output to both file and stdout. The filter defaults
/// to INFO when RUST_LOG is not set.
///
/// Returns a [`LoggingGuard`] that must be kept alive for file logging
/// to work.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created, the log file
/// cannot be cleared, or the path has no file name component.
pub fn init_logging(log_path: &Path) -> Result<LoggingGuard, io::Error> {
    let log_dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let log_file = log_path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name")
    })?;

    fs::create_dir_all(log_dir)?;

    // Clear the previous session's log file
    fs::write(log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // init_logging itself cannot run in unit tests because tracing's
    // global subscriber can only be installed once per process. These
    // tests cover the path handling and file operations around it.

    #[test]
    fn test_creates_directory_and_clears_file() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("logs").join("stratus.log");

        fs::create_dir_all(log_path.parent().unwrap()).unwrap();
        fs::write(&log_path, "old log data").unwrap();
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "old log data");

        fs::write(&log_path, "").unwrap();
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_path_without_file_name_rejected() {
        let err = init_logging(Path::new("/")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }
}
