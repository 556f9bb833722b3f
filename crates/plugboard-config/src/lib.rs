// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Plugboard.
//!
//! Layered TOML configuration with `PLUGBOARD_` environment overrides,
//! strict runtime sections with typo suggestions, `.properties` support and
//! per-module configuration views.
//!
//! # Usage
//!
//! ```no_run
//! use plugboard_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("plugins from: {:?}", config.plugin.location);
//! ```

pub mod diagnostic;
pub mod layered;
pub mod loader;
pub mod model;
pub mod properties;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use layered::{ConfigFormat, HostConfig, ModuleConfigFile};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{ExtensionsConfig, LoggingConfig, PluginConfig, PlugboardConfig};
pub use properties::{Properties, PropertiesProvider, split_list};

/// Loads configuration from the standard hierarchy and validates it.
pub fn load_and_validate() -> Result<PlugboardConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Loads and validates an explicit [`HostConfig`].
pub fn validate_host(host: &HostConfig) -> Result<PlugboardConfig, Vec<ConfigError>> {
    finish(host.extract(), collect_toml_sources)
}

/// Loads configuration from a TOML string and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<PlugboardConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<PlugboardConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<PlugboardConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Reads the config files that exist, for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(loader::CONFIG_FILE_NAME));
    }
    if let Some(user) = loader::user_config_path() {
        paths.push(user);
    }
    paths.push(loader::system_config_path());

    paths
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
