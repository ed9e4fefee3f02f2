//! Tracing setup for the process.
//!
//! Two sinks: stderr, filtered by `RUST_LOG`, and a daily rolling file that
//! always records info and above.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "termsync=info,termsync_cli=info,termsync_engine=info";

const LOG_FILE_PREFIX: &str = "termsync";
const LOG_FILE_SUFFIX: &str = "log";
const MAX_LOG_FILES: usize = 7;

/// Daily rolling appender under `dir`, keeping the last week of files.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}

/// Install the global subscriber. Call once, from `main`, before any other work.
///
/// Console logs go to stderr so stdout stays usable for the report. The
/// returned guard flushes the file writer on drop and must outlive the run.
pub fn init(log_dir: &Path) -> Result<WorkerGuard, InitError> {
    let (writer, guard) = tracing_appender::non_blocking(file_appender(log_dir)?);

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()));

    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(LevelFilter::INFO);

    tracing_subscriber::registry().with(console).with(file).init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_appender_writes_dated_log_file() {
        let dir = tempfile::tempdir().unwrap();

        let mut appender = file_appender(dir.path()).unwrap();
        appender.write_all(b"reconcile started\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
        assert!(names[0].starts_with("termsync."), "{}", names[0]);
        assert!(names[0].ends_with(".log"), "{}", names[0]);

        let contents = std::fs::read_to_string(dir.path().join(&names[0])).unwrap();
        assert_eq!(contents, "reconcile started\n");
    }

    #[test]
    fn file_appender_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs");

        file_appender(&nested).unwrap();

        assert!(nested.is_dir());
    }
}
