use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::{fmt::time::UtcTime, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize logging for the process: stdout always, plus a buffered
/// rolling file appender when enabled. The config level wins over the
/// RUST_LOG env var; the fallback is "info".
pub fn init_with_config(cfg: &LoggingConfig) {
    let env_filter = match cfg.level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stdout_json = matches!(cfg.format, LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stdout)
    });
    let stdout_text = matches!(cfg.format, LogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stdout)
    });

    let file_writer = cfg.enable_file_logging.then(|| file_writer(cfg)).flatten();
    let file_json = file_writer.clone().and_then(|writer| {
        matches!(cfg.format, LogFormat::Json).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(writer)
        })
    });
    let file_text = file_writer.and_then(|writer| {
        matches!(cfg.format, LogFormat::Text).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(writer)
        })
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_json)
        .with(stdout_text)
        .with(file_json)
        .with(file_text)
        .try_init();
}

fn file_writer(cfg: &LoggingConfig) -> Option<NonBlocking> {
    let rotation = match cfg.rotation.to_lowercase().as_str() {
        "hourly" => tracing_appender::rolling::Rotation::HOURLY,
        "never" => tracing_appender::rolling::Rotation::NEVER,
        _ => tracing_appender::rolling::Rotation::DAILY,
    };

    if std::fs::create_dir_all(&cfg.dir).is_err() {
        eprintln!(
            "Failed to create log directory '{}', continuing with stdout logs",
            cfg.dir
        );
        return None;
    }

    let appender =
        tracing_appender::rolling::RollingFileAppender::new(rotation, &cfg.dir, &cfg.filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // Keep the guard alive for the process lifetime so buffered lines flush.
    let _leaked: &'static _ = Box::leak(Box::new(guard));

    Some(writer)
}
