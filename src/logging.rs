use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "flowfield.log";

/// <cache dir>/flowfield/logs
pub fn log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("flowfield").join("logs"))
}

/// Route tracing output to a log file. The terminal belongs to the renderer,
/// so nothing is written to stdout or stderr.
///
/// `RUST_LOG` wins over `level`. Returns the log file path, or `None` when
/// there is nowhere to write logs (logging is then disabled).
pub fn init(level: &str) -> Option<PathBuf> {
    let dir = log_dir()?;
    if std::fs::create_dir_all(&dir).is_err() {
        return None;
    }

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(&dir)
        .ok()?;
    let file_layer = fmt::layer().with_writer(appender).with_ansi(false);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok()?;

    Some(dir.join(LOG_FILE))
}
