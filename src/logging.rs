use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::{LOG_DIR, LOG_FILE_PREFIX};

const DEFAULT_FILTER: &str = "home_data=info,warn";

/// Human-readable logs on stderr plus a daily JSON file under [`LOG_DIR`].
///
/// Stdout is left to command output (`lookup` prints its result there).
/// The returned guard flushes the file writer on drop; hold it for the
/// life of the process.
pub fn init_logging() -> WorkerGuard {
    let dir = Path::new(LOG_DIR);
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("cannot create log directory {}: {e}", dir.display());
    }
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    guard
}
