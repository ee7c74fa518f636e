//! Tracing setup for the CLI
//!
//! Logs go to stderr so stdout stays clean for JSON output, or to a daily rolling file when a
//! log directory is given.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;

/// Resolve the log level from `RUST_LOG`, defaulting to `info`
pub fn resolve_log_level() -> LevelFilter {
    parse_level(std::env::var("RUST_LOG").ok().as_deref())
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("trace") => LevelFilter::TRACE,
        Some("debug") => LevelFilter::DEBUG,
        Some("info") => LevelFilter::INFO,
        Some("warn") | Some("warning") => LevelFilter::WARN,
        Some("error") => LevelFilter::ERROR,
        Some("off") => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held until exit. If a
/// subscriber is already installed this is a no-op.
pub fn init_tracing(level: LevelFilter, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| anyhow::anyhow!("Failed to create log directory {}: {}", dir.display(), e))?;
            let file_appender = tracing_appender::rolling::daily(dir, "cache_analyzer");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(non_blocking)
                .with_ansi(false)
                .try_init();
            Ok(Some(guard))
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .try_init();
            Ok(None)
        }
    }
}
