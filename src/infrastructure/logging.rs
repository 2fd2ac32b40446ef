//! Centralized file-based logging system
//!
//! Writes logs to files under the configured directory, separated by log type:
//! - main/  - all events, JSON
//! - error/ - WARN and ERROR only
//! - feed/  - feed connection and decode events
//! - scan/  - detected cycles and scan summaries
//!
//! A console layer is always installed. `RUST_LOG` overrides the
//! configured level.

use crate::infrastructure::config::LoggingConfig;
use std::fs;
use std::io;
use std::path::Path;
use tracing::Dispatch;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// File log types, one subdirectory each
const LOG_TYPES: [&str; 4] = ["main", "error", "feed", "scan"];

/// Initialize logging
///
/// Returns the appender guards, which must be kept alive for the
/// duration of the program or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Vec<WorkerGuard>> {
    let (dispatch, guards) = build_dispatch(config)?;
    dispatch.init();

    if config.file_logging {
        tracing::info!(dir = %config.dir.display(), "Logging system initialized");
    }

    Ok(guards)
}

/// Assemble the subscriber without installing it
fn build_dispatch(config: &LoggingConfig) -> io::Result<(Dispatch, Vec<WorkerGuard>)> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if !config.file_logging {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true);
        let subscriber = tracing_subscriber::registry().with(filter).with(console_layer);
        return Ok((Dispatch::new(subscriber), Vec::new()));
    }

    prepare_dirs(&config.dir)?;

    let mut guards = Vec::new();

    let (main_appender, main_guard) = create_appender(&config.dir, "main");
    guards.push(main_guard);

    let (error_appender, error_guard) = create_appender(&config.dir, "error");
    guards.push(error_guard);

    let (feed_appender, feed_guard) = create_appender(&config.dir, "feed");
    guards.push(feed_guard);

    let (scan_appender, scan_guard) = create_appender(&config.dir, "scan");
    guards.push(scan_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(LevelFilter::WARN);

    let feed_layer = tracing_subscriber::fmt::layer()
        .with_writer(feed_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(filter_fn(|metadata| {
            is_feed_target(metadata.target())
        }));

    let scan_layer = tracing_subscriber::fmt::layer()
        .with_writer(scan_appender)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_filter(filter_fn(|metadata| metadata.target() == "scan"));

    // Console layer for development
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(error_layer)
        .with(feed_layer)
        .with(scan_layer)
        .with(console_layer);

    Ok((Dispatch::new(subscriber), guards))
}

/// Events routed to the feed log
fn is_feed_target(target: &str) -> bool {
    target == "feed" || target.contains("ws::") || target.contains("exchanges::")
}

/// Create the log root and one subdirectory per log type
fn prepare_dirs(root: &Path) -> io::Result<()> {
    for log_type in LOG_TYPES {
        fs::create_dir_all(root.join(log_type))?;
    }
    Ok(())
}

/// Create a daily rolling, non-blocking file appender
fn create_appender(root: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, root.join(name), name);
    tracing_appender::non_blocking(appender)
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_feed {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "feed", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_scan {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "scan", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_api {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "api", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_creation() {
        let test_dir = std::env::temp_dir().join(format!("vector_cycle_logs_{}", std::process::id()));
        fs::remove_dir_all(&test_dir).ok();

        prepare_dirs(&test_dir).unwrap();
        for log_type in LOG_TYPES {
            assert!(test_dir.join(log_type).is_dir());
        }

        // Idempotent
        prepare_dirs(&test_dir).unwrap();

        fs::remove_dir_all(&test_dir).ok();
    }

    fn read_dir_text(dir: &Path) -> String {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect()
    }

    #[test]
    fn test_console_only_subscriber_builds() {
        let config = LoggingConfig {
            file_logging: false,
            ..LoggingConfig::default()
        };
        let (dispatch, guards) = build_dispatch(&config).unwrap();
        assert!(guards.is_empty());

        tracing::dispatcher::with_default(&dispatch, || {
            crate::log_main!(tracing::Level::INFO, "console only");
        });
    }

    #[test]
    fn test_file_subscriber_routes_by_target() {
        let test_dir = std::env::temp_dir().join(format!("vector_cycle_routing_{}", std::process::id()));
        fs::remove_dir_all(&test_dir).ok();

        let config = LoggingConfig {
            file_logging: true,
            dir: test_dir.clone(),
            level: "debug".to_string(),
        };
        let (dispatch, guards) = build_dispatch(&config).unwrap();
        assert_eq!(guards.len(), LOG_TYPES.len());

        tracing::dispatcher::with_default(&dispatch, || {
            crate::log_feed!(tracing::Level::WARN, "feed line");
            crate::log_scan!(tracing::Level::WARN, "scan line");
        });
        // Flushes the non-blocking writers
        drop(guards);

        let feed = read_dir_text(&test_dir.join("feed"));
        assert!(feed.contains("feed line"));
        assert!(!feed.contains("scan line"));

        let scan = read_dir_text(&test_dir.join("scan"));
        assert!(scan.contains("scan line"));
        assert!(!scan.contains("feed line"));

        assert!(read_dir_text(&test_dir.join("error")).contains("scan line"));
        assert!(read_dir_text(&test_dir.join("main")).contains("feed line"));

        fs::remove_dir_all(&test_dir).ok();
    }

    #[test]
    fn test_feed_target_routing() {
        assert!(is_feed_target("feed"));
        assert!(is_feed_target("vector_cycle::ws::connection"));
        assert!(is_feed_target("vector_cycle::exchanges::stream"));
        assert!(!is_feed_target("scan"));
        assert!(!is_feed_target("api"));
    }
}
