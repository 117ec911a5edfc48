//! Logging setup for the simulator binary.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the subscriber. With a log file the output goes there through a
/// non-blocking appender; the returned guard must live until exit or tail
/// lines are lost.
pub fn init(log_file: Option<&Path>) -> Option<WorkerGuard> {
    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().map(|f| f.to_os_string());
            match (dir, file_name) {
                (Some(dir), Some(file_name)) => {
                    let appender = tracing_appender::rolling::never(dir, file_name);
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    tracing_subscriber::fmt()
                        .with_env_filter(env_filter())
                        .with_writer(writer)
                        .with_ansi(false)
                        .init();
                    Some(guard)
                }
                _ => {
                    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
                    tracing::warn!(path = %path.display(), "Unusable log file path; logging to stderr");
                    None
                }
            }
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
            None
        }
    }
}
