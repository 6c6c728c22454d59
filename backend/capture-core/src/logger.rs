//! Logging backend for hosts embedding the SDK.
//!
//! Dual output (colored stdout + plain file). The level comes from
//! [`SdkConfig`](crate::config::SdkConfig); initialization runs once per process.

use crate::config::SdkConfig;
use crate::error::LoggerError;

use common::ErrorLocation;

use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "capture-sdk.log";

/// Install the logger. Later calls warn and return Ok.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created, or if
/// another logger is already installed.
pub fn initialize(log_dir: &Path, level: LevelFilter) -> Result<(), LoggerError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, level);
        if result.is_ok() {
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

/// [`initialize`] with the directory and level from `config`.
///
/// Without `logging.directory` the log file lands in the system temp dir.
pub fn initialize_from_config(config: &SdkConfig) -> Result<(), LoggerError> {
    let log_dir = config
        .logging
        .directory
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    initialize(&log_dir, config.log_level())
}

#[track_caller]
fn initialize_internal(log_dir: &Path, level: LevelFilter) -> Result<(), LoggerError> {
    std::fs::create_dir_all(log_dir).map_err(|e| LoggerError::LogFile {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{target}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                message = message,
                target = record.target(),
            ))
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(
            fern::log_file(&log_file_path).map_err(|e| LoggerError::LogFile {
                message: format!("Failed to create log file: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?,
        );

    Dispatch::new()
        .level(level)
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| LoggerError::Initialization {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(())
}
