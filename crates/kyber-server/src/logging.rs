//! Process-wide log sinks: console plus the append-only error log.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use kyber_core::config::LogConfig;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_CONSOLE_FILTER: &str = "kyber_server=info,kyber_scheduler=info,kyber_fetcher=warn";

/// Open the error log for appending, creating it (and its directory) if
/// needed. Truncated first when `truncate_on_start` is set.
pub fn open_error_log(config: &LogConfig) -> anyhow::Result<File> {
    let path = Path::new(&config.error_log_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening error log {}", path.display()))?;
    if config.truncate_on_start {
        file.set_len(0)
            .with_context(|| format!("truncating error log {}", path.display()))?;
    }
    Ok(file)
}

/// Install the global subscriber.
///
/// Console output follows `RUST_LOG`. Every warning and error, including each
/// failed fetch, also goes to the error log with a timestamp and call site.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let error_log = open_error_log(config)?;

    let console = tracing_subscriber::fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_CONSOLE_FILTER.into()),
    );
    let errors = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(error_log))
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(console)
        .with(errors)
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(())
}
