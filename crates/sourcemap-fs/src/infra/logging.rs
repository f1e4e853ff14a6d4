//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::infra::config::LogConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// The terminal is owned by the UI while it runs, so output goes to `log.file`. Without one,
/// events are dropped unless `RUST_LOG` asks for them, in which case they go to stderr.
pub fn init(config: &LogConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let Some(filter) = resolve_filter(rust_log.as_deref(), config)? else {
        return Ok(());
    };

    let Some(path) = &config.file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .try_init();
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    // A second init (tests, embedding) keeps the existing subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

/// Filter to install, or `None` when nothing should be logged.
///
/// Valid `RUST_LOG` directives always apply. The configured level only applies with a log file.
fn resolve_filter(rust_log: Option<&str>, config: &LogConfig) -> Result<Option<EnvFilter>> {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(Some(filter));
    }
    if config.file.is_none() {
        return Ok(None);
    }
    EnvFilter::try_new(config.level())
        .map(Some)
        .context("invalid log level")
}
