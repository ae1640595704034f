//! Validation helpers for configuration values
//!
//! Shared by the command line and the TOML configuration layer so both
//! reject the same inputs with the same messages.

use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// A configuration value failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl crate::core::error_handling::ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<String> {
        Some(self.message.clone())
    }
}

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<usize, ValidationError> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ValidationError::new("Value must be greater than 0")),
        Ok(n) => Ok(n),
        Err(_) => Err(ValidationError::new(&format!(
            "'{}' is not a valid positive integer",
            value
        ))),
    }
}

/// Parse a duration such as `90s`, `5m`, `1h30m`, `250ms` or a bare number of seconds
///
/// `0` (with or without unit) yields `Duration::ZERO`, which callers treat as "no timeout".
pub fn parse_duration(value: &str) -> Result<Duration, ValidationError> {
    let input = value.trim();
    if input.is_empty() {
        return Err(ValidationError::new("Duration cannot be empty"));
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let invalid = || {
        ValidationError::new(&format!(
            "Invalid duration '{}': expected e.g. '30s', '5m', '1h30m' or '0'",
            value
        ))
    };

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        if digits_end == 0 {
            return Err(invalid());
        }
        let amount: u64 = rest[..digits_end].parse().map_err(|_| invalid())?;
        rest = &rest[digits_end..];
        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let part = match unit {
            "ms" => Duration::from_millis(amount),
            "s" | "sec" | "secs" => Duration::from_secs(amount),
            "m" | "min" | "mins" => Duration::from_secs(amount * 60),
            "h" | "hr" | "hrs" => Duration::from_secs(amount * 3600),
            _ => return Err(invalid()),
        };
        total += part;
    }
    Ok(total)
}

/// Split comma-separated entries, trim them, drop empties and de-duplicate keeping first occurrence
pub fn split_and_collect<T>(items: &[T], to_string: impl Fn(&T) -> String) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        for part in to_string(item).split(',') {
            let trimmed = part.trim();
            if !trimmed.is_empty() && seen.insert(trimmed.to_string()) {
                result.push(trimmed.to_string());
            }
        }
    }
    result
}
