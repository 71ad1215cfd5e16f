//! Logging setup for csvsteward
//!
//! Logs go to the console and to daily rolling files:
//!
//! - `csvsteward.<date>.log`: everything that passes the filter
//! - `error.<date>.log`: warnings and errors only
//!
//! The filter defaults to `info` and can be overridden with `RUST_LOG`.
//!
//! ```no_run
//! use csvsteward::logging;
//!
//! logging::init(None).expect("Failed to initialize logging");
//! tracing::info!("Service started");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Log directory, creating it if needed.
///
/// Uses `configured` when given, otherwise `<data dir>/csvsteward/logs`
/// (`~/.local/share/csvsteward/logs` on Linux).
pub fn get_log_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let log_dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .context("Failed to determine data directory")?
            .join("csvsteward")
            .join("logs"),
    };

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or an appender fails
pub fn init(configured_dir: Option<&Path>) -> Result<PathBuf> {
    let log_dir = get_log_dir(configured_dir)?;

    let all_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("csvsteward")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create all-logs file appender")?;

    let error_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("error")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create error-logs file appender")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_file(true)
        .compact();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized, writing to {}",
        current_log_path(&log_dir).display()
    );

    Ok(log_dir)
}

/// Path of today's main log file in `log_dir`. The appender rolls on UTC dates.
pub fn current_log_path(log_dir: &Path) -> PathBuf {
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    log_dir.join(format!("csvsteward.{today}.log"))
}
