//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Largest accepted `events.history_capacity`.
pub const MAX_HISTORY_CAPACITY: usize = 100_000;
/// Largest accepted `events.channel_capacity`.
pub const MAX_CHANNEL_CAPACITY: usize = 1_048_576;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_events(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_events(config: &Config) -> ConfigResult<()> {
    let e = &config.events;

    if e.history_capacity == 0 || e.history_capacity > MAX_HISTORY_CAPACITY {
        return Err(ConfigError::ValidationError {
            field: "events.history_capacity".to_owned(),
            message: format!("history_capacity must be between 1 and {MAX_HISTORY_CAPACITY}"),
        });
    }

    if e.channel_capacity == 0 || e.channel_capacity > MAX_CHANNEL_CAPACITY {
        return Err(ConfigError::ValidationError {
            field: "events.channel_capacity".to_owned(),
            message: format!("channel_capacity must be between 1 and {MAX_CHANNEL_CAPACITY}"),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !LOG_LEVELS.contains(&l.level.to_lowercase().as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "invalid log level '{}'; expected one of: {}",
                l.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !LOG_FORMATS.contains(&l.format.to_lowercase().as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "invalid log format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    if let Some(bad) = l.directives.iter().find(|d| d.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "logging.directives".to_owned(),
            message: format!("directive '{bad}' is empty"),
        });
    }

    Ok(())
}
