//! Tracing subscriber setup.
//!
//! Logs go to stderr. When a log directory is configured they are also
//! written to a daily rolling file `tripcast.log.YYYY-MM-DD` in it.
//! `RUST_LOG` overrides the configured level.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSettings;

const LOG_FILE_PREFIX: &str = "tripcast.log";

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(level: &str) -> String {
    format!("tripcast={level},tripcast_cli={level},warn", level = level)
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when file logging is enabled. Keep it
/// alive until exit or buffered lines are lost. Installing twice is a no-op.
pub fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&settings.level)));

    let (file_layer, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        return None;
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(
            default_directive("debug"),
            "tripcast=debug,tripcast_cli=debug,warn"
        );
        assert!(EnvFilter::try_new(default_directive("info")).is_ok());
    }
}
