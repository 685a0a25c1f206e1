// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as well-formed service URLs and sane polling bounds.

use crate::diagnostic::ConfigError;
use crate::model::ArcanumConfig;

/// Log levels accepted by `client.log_level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ArcanumConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    for (key, url) in [
        ("services.reading_url", &config.services.reading_url),
        ("services.layout_url", &config.services.layout_url),
        (
            "services.interpretation_url",
            &config.services.interpretation_url,
        ),
    ] {
        let url = url.trim();
        if url.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{url}` must start with http:// or https://"),
            });
        }
    }

    if config.services.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "services.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.poller.interval_ms < 100 {
        errors.push(ConfigError::Validation {
            message: format!(
                "poller.interval_ms must be at least 100, got {}",
                config.poller.interval_ms
            ),
        });
    }

    if config.poller.max_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: "poller.max_attempts must be at least 1".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.client.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "client.log_level `{}` is not one of: {}",
                config.client.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
