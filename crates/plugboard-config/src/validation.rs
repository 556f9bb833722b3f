// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use tracing::warn;

use crate::diagnostic::ConfigError;
use crate::model::PlugboardConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates a deserialized configuration, collecting every error.
///
/// A `plugin.location` that does not exist is not an error here: discovery
/// warns and runs without plugins.
pub fn validate_config(config: &PlugboardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if let Some(location) = &config.plugin.location
        && location.as_os_str().is_empty()
    {
        errors.push(ConfigError::validation(
            "plugin.location must not be empty when set",
        ));
    }

    for prefix in &config.plugin.host_prefixes {
        if prefix.trim().is_empty() {
            errors.push(ConfigError::validation(
                "plugin.host_prefixes must not contain blank entries",
            ));
        } else if !prefix.ends_with('.') {
            warn!(
                prefix = %prefix,
                "host prefix does not end with '.', it also matches sibling packages"
            );
        }
    }

    if let Some(only) = &config.extensions.only
        && config
            .extensions
            .exclude
            .iter()
            .any(|k| k.eq_ignore_ascii_case(only))
    {
        errors.push(ConfigError::validation(format!(
            "extensions.only `{only}` is also listed in extensions.exclude"
        )));
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.logging.level
        )));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
