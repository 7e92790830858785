//! Tracing setup: stderr by default, `<state>/logs/` when `logging.to_file` is set

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Keeps the file writer flushing until dropped at exit
pub struct LoggingHandle {
    _guard: Option<WorkerGuard>,
    /// Set when logging to a file
    pub log_file_path: Option<PathBuf>,
}

/// Filter directive in order of precedence: `RUST_LOG`, `--debug`, config
pub fn filter_directive(rust_log: Option<String>, config: &Config, debug: bool) -> String {
    match rust_log.filter(|v| !v.trim().is_empty()) {
        Some(directive) => directive,
        None if debug => "debug".to_string(),
        None => config.logging.level.clone(),
    }
}

pub fn log_file_name(started: DateTime<Utc>) -> String {
    format!("booth-{}.log", started.format("%Y%m%dT%H%M%SZ"))
}

/// Install the global subscriber. Call once, from `main`.
pub fn init_logging(config: &Config, debug: bool) -> Result<LoggingHandle> {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), config, debug);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{directive}'"))?;
    let layer = fmt::layer().with_target(false);

    if !config.logging.to_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_writer(std::io::stderr))
            .init();
        return Ok(LoggingHandle {
            _guard: None,
            log_file_path: None,
        });
    }

    let logs_dir = config.logs_path();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;
    let file_name = log_file_name(Utc::now());
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&logs_dir, &file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer.with_ansi(false).with_writer(writer))
        .init();

    Ok(LoggingHandle {
        _guard: Some(guard),
        log_file_path: Some(logs_dir.join(file_name)),
    })
}
