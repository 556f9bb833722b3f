// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the Plugboard host.
//!
//! Runtime sections reject unknown keys. Unknown top-level tables are left
//! alone: they belong to the host application and stay visible in every
//! extension's configuration view.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Plugboard configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlugboardConfig {
    /// Plugin discovery settings.
    #[serde(default)]
    pub plugin: PluginConfig,

    /// Extension selection settings.
    #[serde(default)]
    pub extensions: ExtensionsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Plugin discovery configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Root directory holding one sub-directory per module. When unset the
    /// host runs without plugins.
    #[serde(default)]
    pub location: Option<PathBuf>,

    /// Extra prefixes every module resolves through the host, on top of the
    /// built-in ones.
    #[serde(default)]
    pub host_prefixes: Vec<String>,
}

/// Which exported extensions get registered.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionsConfig {
    /// Register only the extension with this key.
    #[serde(default)]
    pub only: Option<String>,

    /// Never register extensions with these keys.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ExtensionsConfig {
    /// Whether an extension with `key` passes the filter (case-insensitive).
    pub fn allows(&self, key: &str) -> bool {
        if self.exclude.iter().any(|k| k.eq_ignore_ascii_case(key)) {
            return false;
        }
        match &self.only {
            Some(only) if !only.is_empty() => only.eq_ignore_ascii_case(key),
            _ => true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
