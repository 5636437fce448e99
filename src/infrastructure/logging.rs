//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - File logging with startup rotation and cleanup
//! - Configuration file based log level control
//! - Structured JSON logging (optional)
//! - Console and file output support
//! - Mexico City (UTC-6) timestamps, matching the registry's local time

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::default_log_dir;

/// Active log file; rotated to a timestamped name on the next startup
pub const LOG_FILE_NAME: &str = "impi-search.log";

const MEXICO_CITY_UTC_OFFSET_SECONDS: i32 = 6 * 3600;

/// Dependencies that are noisy below TRACE
const NOISY_TARGETS: &[(&str, &str)] = &[
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("h2", "warn"),
    ("rustls", "warn"),
    ("cookie_store", "warn"),
    ("html5ever", "warn"),
    ("selectors", "warn"),
    ("tokio", "info"),
    ("runtime", "warn"),
];

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn mexico_city_offset() -> FixedOffset {
    FixedOffset::west_opt(MEXICO_CITY_UTC_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Custom time formatter for Mexico City local time (UTC-6)
struct MexicoCityTimeFormatter;

impl FormatTime for MexicoCityTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let local = Utc::now().with_timezone(&mexico_city_offset());
        write!(w, "{}", local.format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Directory log files are written to
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config.log_dir.clone().unwrap_or_else(default_log_dir)
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration
///
/// Unless the level asks for TRACE, HTTP client and HTML parser internals are
/// suppressed. `RUST_LOG` replaces the whole filter when set:
/// ```bash
/// RUST_LOG="debug,reqwest=debug,hyper=debug" live_search_sanity "LUNA AZUL"
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut log_dir = None;

    if config.file_output {
        let dir = get_log_directory(config);
        std::fs::create_dir_all(&dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", dir, e))?;

        if config.auto_cleanup_logs {
            rotate_existing_log_file(&dir, LOG_FILE_NAME)?;
            cleanup_old_logs(&dir, config.max_files)?;
        }

        let file_appender = rolling::never(&dir, LOG_FILE_NAME);
        let (file_writer, file_guard) = non_blocking(file_appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file_layer: BoxedLayer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(MexicoCityTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed()
        } else {
            // time + level + message only
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(MexicoCityTimeFormatter)
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(false)
                .boxed()
        };
        layers.push(file_layer);
        log_dir = Some(dir);
    }

    if config.console_output {
        layers.push(
            fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_timer(MexicoCityTimeFormatter)
                .with_target(false)
                .boxed(),
        );
    }

    if layers.is_empty() {
        return Err(anyhow!("No logging output configured"));
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install global subscriber: {}", e))?;

    info!("Logging system initialized");
    if let Some(dir) = &log_dir {
        info!("Log directory: {:?}", dir);
    }
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    info!("Console output: {}", config.console_output);
    info!("File output: {}", config.file_output);
    if config.level.to_lowercase().contains("trace") {
        info!("TRACE level active - HTTP and parser internals will be shown");
    } else {
        info!("Verbose dependency logs suppressed (use TRACE level to see all logs)");
    }

    Ok(())
}

/// `RUST_LOG` when present, otherwise the configured level plus suppression
/// directives and per-module overrides.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level {:?}: {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in NOISY_TARGETS {
            filter = filter.add_directive(parse_directive(target, level)?);
        }
    }

    filter = filter.add_directive(parse_directive(env!("CARGO_CRATE_NAME"), &config.level)?);

    for (target, level) in &config.module_filters {
        filter = filter.add_directive(parse_directive(target, level)?);
    }

    Ok(filter)
}

fn parse_directive(target: &str, level: &str) -> Result<tracing_subscriber::filter::Directive> {
    format!("{}={}", target, level)
        .parse()
        .map_err(|e| anyhow!("Invalid log directive {}={}: {}", target, level, e))
}

/// Renames an existing log file to `<stem>.<timestamp>.log`.
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<Option<PathBuf>> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;
    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let local: DateTime<FixedOffset> = DateTime::<Utc>::from(file_time).with_timezone(&mexico_city_offset());

    let file_stem = log_file_name.trim_end_matches(".log");
    let timestamped_name = format!("{}.{}.log", file_stem, local.format("%Y%m%dT%H%M%S"));
    let timestamped_path = log_dir.join(&timestamped_name);

    std::fs::rename(&log_file_path, &timestamped_path).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {}",
            log_file_path.display(),
            timestamped_path.display(),
            e
        )
    })?;

    Ok(Some(timestamped_path))
}

/// Keeps the newest `max_files` `.log` files; returns how many were removed.
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".log"));
        if path.is_file() && is_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let keep = max_files as usize;
    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }
    Ok(removed)
}

/// Log system information for diagnostics
pub fn log_system_info(config: &LoggingConfig) {
    info!("=== IMPI Search System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    if config.file_output {
        info!("Log directory: {:?}", get_log_directory(config));
    }
    info!("======================================");
}
