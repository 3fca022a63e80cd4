//! Console + file logging setup

use crate::errors::{MonitorError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: human-readable lines on the console and
/// JSON lines appended to `log_file`.
///
/// Keep the returned guard alive for the life of the process, dropping it
/// flushes the file writer.
pub fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    let (subscriber, guard) = build_subscriber(file)?;

    subscriber
        .try_init()
        .map_err(|e| MonitorError::Other(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}

fn build_subscriber(
    file: File,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, WorkerGuard)> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| MonitorError::Config(format!("Invalid log filter: {}", e)))?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let (file_writer, guard) = tracing_appender::non_blocking(file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(file_writer)
        .json();

    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer);

    Ok((subscriber, guard))
}
