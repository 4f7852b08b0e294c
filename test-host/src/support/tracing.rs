use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Environment variable holding the tracing filter directives
pub const LOG_ENV: &str = "BPRUST_LOG";

const DEFAULT_DIRECTIVES: &str = "info";
const TRACE_FILE_NAME: &str = "bprust_test_host_trace.log";

/// Filter from `BPRUST_LOG`, falling back to `info` when unset or invalid
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Initialize console and file tracing
/// Returns a `WorkerGuard` that must be kept alive for the file log to be flushed
pub fn init_tracing() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(std::env::temp_dir(), TRACE_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    Registry::default()
        .with(env_filter())
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

/// Get the path to the trace log file
pub fn get_trace_log_path() -> PathBuf { std::env::temp_dir().join(TRACE_FILE_NAME) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_log_lives_in_temp_dir() {
        let path = get_trace_log_path();
        assert_eq!(path.parent(), Some(std::env::temp_dir().as_path()));
        assert_eq!(path.file_name().and_then(|name| name.to_str()), Some(TRACE_FILE_NAME));
    }
}
