use chrono::Local;
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// - `RUST_LOG` wins over the configured filter
/// - With `log.directory` set, logs go to a timestamped file there; otherwise to stderr
///
/// Returns the path of the log file when one was opened.
pub fn init_tracing(config: &LogConfig) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| Error::Logging(format!("invalid log filter '{}': {e}", config.filter)))?;

    if let Some(log_dir) = &config.directory {
        std::fs::create_dir_all(log_dir)?;

        let file_name = format!("lookout_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let file_appender = rolling::never(log_dir, &file_name);

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::Layer::new()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| Error::Logging(e.to_string()))?;

        let path = log_dir.join(file_name);
        tracing::debug!(
            target: "lookout::utils::tracing",
            path = %path.display(),
            "Tracing initialized with file output"
        );
        Ok(Some(path))
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::Layer::default()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| Error::Logging(e.to_string()))?;

        tracing::debug!(
            target: "lookout::utils::tracing",
            "Tracing initialized with stderr output"
        );
        Ok(None)
    }
}
