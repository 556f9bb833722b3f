// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host configuration loader built on Figment.
//!
//! Files are looked up as `./plugboard.toml` > `~/.config/plugboard/plugboard.toml`
//! > `/etc/plugboard/plugboard.toml`, with `PLUGBOARD_` environment variables on
//! top. File layers and the environment layer are kept apart so module
//! configuration can be slotted between them (see [`crate::layered`]).

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PlugboardConfig;

/// File name looked up in every configuration directory.
pub const CONFIG_FILE_NAME: &str = "plugboard.toml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "PLUGBOARD_";

/// Sections whose env keys are mapped to nested keys.
const ENV_SECTIONS: &[&str] = &["plugin", "extensions", "logging"];

/// System-wide configuration file.
pub fn system_config_path() -> PathBuf {
    Path::new("/etc/plugboard").join(CONFIG_FILE_NAME)
}

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plugboard").join(CONFIG_FILE_NAME))
}

/// Compiled defaults plus every configuration file, without env overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plugboard/plugboard.toml`
/// 3. `~/.config/plugboard/plugboard.toml`
/// 4. `./plugboard.toml`
pub fn file_layers() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(PlugboardConfig::default()))
        .merge(Toml::file(system_config_path()));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(CONFIG_FILE_NAME))
}

/// Build the full host Figment (files, then env), before extraction.
pub fn build_figment() -> Figment {
    file_layers().merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<PlugboardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No file lookup, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<PlugboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugboardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlugboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugboardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider with an explicit section mapping.
///
/// Only the leading section name is turned into a dot, so
/// `PLUGBOARD_PLUGIN_HOST_PREFIXES` maps to `plugin.host_prefixes`. Keys of
/// other sections stay flat (`PLUGBOARD_GREETER_PREFIX` is `greeter_prefix`).
pub fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_leading_section_only() {
        assert_eq!(map_env_key("plugin_location"), "plugin.location");
        assert_eq!(map_env_key("plugin_host_prefixes"), "plugin.host_prefixes");
        assert_eq!(map_env_key("extensions_only"), "extensions.only");
        assert_eq!(map_env_key("logging_level"), "logging.level");
        assert_eq!(map_env_key("greeter_plugin_x"), "greeter_plugin_x");
        assert_eq!(map_env_key("plugin_"), "plugin_");
        assert_eq!(map_env_key("PLUGIN_HOST_PREFIXES"), "plugin.host_prefixes");
        assert_eq!(map_env_key("GREETER_PREFIX"), "greeter_prefix");
    }

    #[test]
    fn env_overrides_plugin_location() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PLUGBOARD_PLUGIN_LOCATION", "/srv/plugins");
            jail.set_env("PLUGBOARD_LOGGING_LEVEL", "debug");
            let config: PlugboardConfig = Figment::new()
                .merge(Serialized::defaults(PlugboardConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.plugin.location, Some(PathBuf::from("/srv/plugins")));
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"
[logging]
level = "debug"
"#,
            )?;
            let config: PlugboardConfig = file_layers().extract()?;
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }
}
