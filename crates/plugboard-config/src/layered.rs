// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-module configuration views.
//!
//! Every extension sees the host configuration with its own module's
//! `config/` files layered on top of the host files but below host overrides
//! (environment and command line). Two modules never see each other's files.

#![allow(clippy::result_large_err)]

use std::path::Path;

use figment::providers::{Format, Serialized, Toml, Yaml};
use figment::{Figment, Provider};
use tracing::{debug, warn};

use crate::loader;
use crate::model::PlugboardConfig;
use crate::properties::PropertiesProvider;

/// Formats accepted in a module's `config/` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Properties,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Format of a file by extension, `None` for anything else.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "properties" => Some(Self::Properties),
            "yml" | "yaml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// One configuration file shipped by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfigFile {
    /// Display name, e.g. `alpha:config/app.yml`.
    pub name: String,
    pub format: ConfigFormat,
    pub content: String,
}

impl ModuleConfigFile {
    pub fn new(name: impl Into<String>, format: ConfigFormat, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format,
            content: content.into(),
        }
    }

    /// Parses the file eagerly. Returns `None` (and warns) if it is malformed.
    fn provider(&self) -> Option<Figment> {
        let figment = match self.format {
            ConfigFormat::Properties => {
                Figment::from(PropertiesProvider::string(&self.name, &self.content))
            }
            ConfigFormat::Yaml => Figment::from(Yaml::string(&self.content)),
            ConfigFormat::Toml => Figment::from(Toml::string(&self.content)),
        };
        match figment.data() {
            Ok(_) => Some(figment),
            Err(e) => {
                warn!(file = %self.name, error = %e, "skipping unreadable module config file");
                None
            }
        }
    }
}

/// Host configuration kept as two layers: files and overrides.
#[derive(Debug, Clone)]
pub struct HostConfig {
    files: Figment,
    overrides: Figment,
}

impl HostConfig {
    /// Standard file hierarchy plus `PLUGBOARD_*` environment overrides.
    pub fn load() -> Self {
        Self::from_layers(loader::file_layers(), Figment::from(loader::env_provider()))
    }

    pub fn from_layers(files: Figment, overrides: Figment) -> Self {
        Self { files, overrides }
    }

    /// Defaults plus an inline TOML document, no overrides.
    pub fn from_toml_str(content: &str) -> Self {
        Self::from_layers(
            Figment::new()
                .merge(Serialized::defaults(PlugboardConfig::default()))
                .merge(Toml::string(content)),
            Figment::new(),
        )
    }

    /// Adds a provider above every other layer (command-line flags).
    pub fn with_override<P: Provider>(mut self, provider: P) -> Self {
        self.overrides = self.overrides.merge(provider);
        self
    }

    /// The host's effective configuration.
    pub fn figment(&self) -> Figment {
        Figment::new()
            .merge(self.files.clone())
            .merge(self.overrides.clone())
    }

    pub fn extract(&self) -> Result<PlugboardConfig, figment::Error> {
        self.figment().extract()
    }

    /// Configuration view for one module.
    ///
    /// Module files are merged in the given order, later files winning among
    /// themselves. Malformed files are skipped.
    pub fn module_view(&self, files: &[ModuleConfigFile]) -> Figment {
        let mut figment = Figment::new().merge(self.files.clone());
        for file in files {
            if let Some(provider) = file.provider() {
                debug!(file = %file.name, "layering module config file");
                figment = figment.merge(provider);
            }
        }
        figment.merge(self.overrides.clone())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::from_toml_str("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_file_name("app.properties"), Some(ConfigFormat::Properties));
        assert_eq!(ConfigFormat::from_file_name("app.YML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_file_name("app.yaml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_file_name("app.toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_file_name("notes.txt"), None);
        assert_eq!(ConfigFormat::from_file_name("README"), None);
    }

    #[test]
    fn module_files_sit_between_host_files_and_overrides() {
        let host = HostConfig::from_toml_str("[greeter]\nprefix = \"host\"\nsuffix = \"!\"\n")
            .with_override(Serialized::default("greeter.suffix", "?"));
        let view = host.module_view(&[ModuleConfigFile::new(
            "alpha:config/app.properties",
            ConfigFormat::Properties,
            "greeter.prefix=alpha\ngreeter.suffix=.\n",
        )]);

        let prefix: String = view.extract_inner("greeter.prefix").unwrap();
        let suffix: String = view.extract_inner("greeter.suffix").unwrap();
        assert_eq!(prefix, "alpha");
        assert_eq!(suffix, "?");
    }

    #[test]
    fn later_module_files_win() {
        let host = HostConfig::default();
        let view = host.module_view(&[
            ModuleConfigFile::new("a:config/a.properties", ConfigFormat::Properties, "k=props"),
            ModuleConfigFile::new("a:config/b.yml", ConfigFormat::Yaml, "k: yaml\n"),
        ]);
        let k: String = view.extract_inner("k").unwrap();
        assert_eq!(k, "yaml");
    }

    #[test]
    fn malformed_module_file_is_skipped() {
        let host = HostConfig::default();
        let view = host.module_view(&[
            ModuleConfigFile::new("a:config/bad.toml", ConfigFormat::Toml, "not = [valid"),
            ModuleConfigFile::new("a:config/good.toml", ConfigFormat::Toml, "ok = true"),
        ]);
        let ok: bool = view.extract_inner("ok").unwrap();
        assert!(ok);
        assert!(view.extract::<PlugboardConfig>().is_ok());
    }

    #[test]
    fn views_are_isolated_between_modules() {
        let host = HostConfig::default();
        let alpha = host.module_view(&[ModuleConfigFile::new(
            "alpha:config/app.toml",
            ConfigFormat::Toml,
            "only_alpha = 1",
        )]);
        let beta = host.module_view(&[]);
        assert!(alpha.extract_inner::<i64>("only_alpha").is_ok());
        assert!(beta.extract_inner::<i64>("only_alpha").is_err());
    }
}
