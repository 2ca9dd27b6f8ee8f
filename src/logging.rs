//! File-based logging for hlsplay
//!
//! Standard output carries the player's status lines, so tracing output is
//! written to a rolling file instead.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "hlsplay";
const DEFAULT_FILTER: &str = "hlsplay=debug,warn";

/// Initialize the logging system.
///
/// Logs are written to `.logs/hlsplay.YYYY-MM-DD.log` with daily rotation.
/// The filter comes from `RUST_LOG`, then from `configured_filter`, then
/// falls back to debug for this crate and warn for everything else.
pub fn init_logging(configured_filter: Option<&str>) -> anyhow::Result<()> {
    // Make sure .logs/ exists before the appender opens a file in it
    let log_dir = Path::new(LOG_DIR);
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    // One file per day
    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE_PREFIX);

    // Writes happen on a background thread, never on the coordinator task
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes on drop, so it has to outlive every log call
    Box::leak(Box::new(guard));

    // RUST_LOG first, then the config file's filter, then the built-in default.
    // A malformed configured filter falls back to the default too.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured_filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // File output only; stdout belongs to the status lines
    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // plain text in files
        .with_target(true) // module path, e.g. hlsplay::controller
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE); // one line per closed span

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("Logging initialized - logs written to {}/", LOG_DIR);

    Ok(())
}
