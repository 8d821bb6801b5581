//! Logging infrastructure
//!
//! Diagnostics go to stderr and, optionally, to an append-only diagnostic log file.
//! Neither sink is ever read back.

use crate::core::LoggingConfig;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking file writer alive; pending lines are flushed on drop
pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialize the logging system
///
/// Sets up tracing with:
/// - Level from `RUST_LOG`, falling back to the configured level
/// - Text or JSON lines on stderr
/// - An optional diagnostic log file
///
/// Never fails: if the log file cannot be opened, logging continues on stderr only.
pub fn init(config: &LoggingConfig) -> LoggingGuard {
    let (subscriber, guard, file_error) = build_subscriber(config);
    let _ = subscriber.try_init();

    if let Some(e) = file_error {
        tracing::warn!("Diagnostic log file unavailable, logging to stderr only: {}", e);
    }

    LoggingGuard { _guard: guard }
}

pub(crate) fn build_subscriber(
    config: &LoggingConfig,
) -> (
    impl Subscriber + Send + Sync + 'static,
    Option<WorkerGuard>,
    Option<String>,
) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (json_layer, text_layer) = if config.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (
            None,
            Some(fmt::layer().with_target(false).with_writer(std::io::stderr)),
        )
    };

    let mut file_error = None;
    let (file_layer, guard) = match config.log_file.as_deref().map(open_log_file) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            file_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer);

    (subscriber, guard, file_error)
}

/// Initialize logging for tests (logs to the test writer)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender, String> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("invalid log file path: {}", path.display()))?;

    std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| e.to_string())
}
