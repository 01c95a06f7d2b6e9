// Logging for the strata binary, powered by tracing-subscriber.
//
// Engine and client code log through the `log` facade; `tracing_log::LogTracer`
// routes those records into the subscriber installed here. Output goes to a
// file so it never mixes with the interactive terminal; `--verbose` adds a
// stderr layer.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::expand_config_path;
use crate::error::{CLIError, Result};

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Base level plus quiet overrides for chatty dependencies
fn build_env_filter(level: &str) -> Result<EnvFilter> {
    let mut directives = vec![level.to_string()];

    let noisy: &[(&str, &str)] = &[
        ("reqwest", "warn"),
        ("hyper", "warn"),
        ("hyper_util", "warn"),
        ("rustls", "warn"),
        ("rustyline", "warn"),
    ];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str).map_err(|e| {
        CLIError::LoggingError(format!("Invalid log filter '{}': {}", filter_str, e))
    })
}

/// Install the global subscriber.
///
/// `file_path` may start with `~/`. Its parent directory is created when
/// missing and the file is opened in append mode.
pub fn init_logging(level: &str, file_path: &str, format: &str, log_to_console: bool) -> Result<()> {
    let log_format = LogFormat::parse(format);
    let file_path = expand_config_path(Path::new(file_path));

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = Mutex::new(OpenOptions::new().create(true).append(true).open(&file_path)?);

    // Already set when a test or embedding application installed one first
    tracing_log::LogTracer::init().ok();

    let console_layer = if log_to_console {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true)
                .with_filter(build_env_filter(level)?),
        )
    } else {
        None
    };

    let file_layer = if log_format == LogFormat::Json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(log_file)
            .with_target(true)
            .with_thread_names(true)
            .with_filter(build_env_filter(level)?)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(log_file)
            .with_target(true)
            .with_thread_names(true)
            .with_filter(build_env_filter(level)?)
            .boxed()
    };

    let subscriber = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CLIError::LoggingError(e.to_string()))?;

    tracing::debug!(
        "Logging initialized: level={}, console={}, file={}",
        level,
        log_to_console,
        file_path.display()
    );
    Ok(())
}
