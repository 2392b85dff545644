//! Configuration validation.
//!
//! Validates the `[fetch]` section before any request is made.

use crate::domain::error::FxError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_fetch_config(config: &dyn ConfigPort) -> Result<(), FxError> {
    validate_dates(config)?;
    validate_timeout(config)?;
    validate_currency(config)?;
    validate_base_url(config)?;
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FxError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(FxError::ConfigInvalid {
                section: "fetch".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

pub fn parse_optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, FxError> {
    match config.get_string("fetch", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FxError::ConfigInvalid {
                section: "fetch".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), FxError> {
    let value = config.get_int("fetch", "timeout_secs", 10);
    if value <= 0 {
        return Err(FxError::ConfigInvalid {
            section: "fetch".to_string(),
            key: "timeout_secs".to_string(),
            reason: "timeout_secs must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_currency(config: &dyn ConfigPort) -> Result<(), FxError> {
    match config.get_string("fetch", "currency") {
        Some(s) if s.trim().is_empty() => Err(FxError::ConfigInvalid {
            section: "fetch".to_string(),
            key: "currency".to_string(),
            reason: "currency must not be empty".to_string(),
        }),
        Some(s) if !s.trim().chars().all(|c| c.is_ascii_alphabetic()) => {
            Err(FxError::ConfigInvalid {
                section: "fetch".to_string(),
                key: "currency".to_string(),
                reason: format!("currency must be a letter code, got {:?}", s.trim()),
            })
        }
        _ => Ok(()),
    }
}

fn validate_base_url(config: &dyn ConfigPort) -> Result<(), FxError> {
    match config.get_string("fetch", "base_url") {
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            Err(FxError::ConfigInvalid {
                section: "fetch".to_string(),
                key: "base_url".to_string(),
                reason: "base_url must start with http:// or https://".to_string(),
            })
        }
        _ => Ok(()),
    }
}
