// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin discovery.
//!
//! Every immediate sub-directory of the plugin root is one module:
//!
//! ```text
//! <root>/<module>/
//!     <module>.tar | .tar.gz | .tgz | classes/   body
//!     lib/*.tar | *.tar.gz | *.tgz               private dependencies
//!     classloader.properties                     optional prefix lists
//!     services/*                                 declared extension types
//!     config/*.properties | *.yml | *.toml       module configuration
//! ```
//!
//! A module that fails to load is logged and left out; the others still load.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use plugboard_config::{ConfigFormat, ModuleConfigFile, Properties};
use plugboard_core::{DiscoveryError, HostNamespace};
use tracing::{debug, info, warn};

use crate::archive::{ModuleArchive, is_bundle_name};
use crate::exporter::ServiceManifest;
use crate::loader::ModuleLoader;
use crate::module::Module;
use crate::policy::{CLASSLOADER_CONFIG_FILE, ResolutionPolicy};
use crate::registry::ModuleRegistry;

const CLASSES_DIR: &str = "classes/";
const LIB_DIR: &str = "lib/";
const CONFIG_DIR: &str = "config/";

/// Outcome of a discovery run.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub modules: Vec<Module>,
    /// Modules that were left out, with the reason.
    pub errors: Vec<DiscoveryError>,
}

/// Discovers modules under a plugin root.
#[derive(Debug, Clone)]
pub struct Discovery {
    host: Arc<HostNamespace>,
    host_prefixes: Vec<String>,
}

impl Discovery {
    pub fn new(host: Arc<HostNamespace>) -> Self {
        Self {
            host,
            host_prefixes: Vec::new(),
        }
    }

    /// Extra host-forced prefixes applied to every module.
    pub fn with_host_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.host_prefixes = prefixes;
        self
    }

    pub fn host(&self) -> &Arc<HostNamespace> {
        &self.host
    }

    /// Discovers modules, logging and dropping the ones that fail.
    pub fn discover(&self, root: Option<&Path>) -> Vec<Module> {
        self.discover_with_report(root).modules
    }

    /// Discovers modules and builds the registry from them.
    pub fn build_registry(&self, root: Option<&Path>) -> ModuleRegistry {
        ModuleRegistry::new(Arc::clone(&self.host), self.discover(root))
    }

    pub fn discover_with_report(&self, root: Option<&Path>) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        let Some(root) = root else {
            warn!("no plugin location configured, running without plugins (set plugin.location)");
            return report;
        };

        if !root.exists() {
            warn!(location = %root.display(), "plugin location does not exist, running without plugins");
            if let Some(hint) = home_hint(root) {
                warn!(
                    suggestion = %hint.display(),
                    "'~' is only expanded by a shell, use a full path for plugin.location"
                );
            }
            return report;
        }

        if !root.is_dir() {
            warn!(
                location = %root.display(),
                "packaged plugin roots are not supported, put module directories under plugin.location"
            );
            return report;
        }

        let dirs = match module_dirs(root) {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!(location = %root.display(), error = %e, "failed to list plugin location");
                return report;
            }
        };

        for dir in dirs {
            match self.load_module(&dir) {
                Ok(module) => {
                    info!(
                        module = %module.name(),
                        locations = module.loader().locations().len(),
                        declared = module.manifest().len(),
                        "loaded plugin module"
                    );
                    report.modules.push(module);
                }
                Err(e) => {
                    warn!(module = %e.module(), error = %e, "failed to load plugin module, skipping");
                    report.errors.push(e);
                }
            }
        }
        report
    }

    /// Loads a single module directory.
    pub fn load_module(&self, dir: &Path) -> Result<Module, DiscoveryError> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let archive_err = |source| DiscoveryError::Archive {
            module: name.clone(),
            source,
        };

        let archive = ModuleArchive::open(dir).map_err(archive_err)?;

        let body = archive
            .nested_archives(|e| e == CLASSES_DIR || (!e.contains('/') && is_bundle_name(e)))
            .map_err(archive_err)?;
        if body.is_empty() {
            return Err(DiscoveryError::MissingBody { module: name });
        }

        let dependencies = archive
            .nested_archives(|e| e.starts_with(LIB_DIR) && !e.ends_with('/') && is_bundle_name(e))
            .map_err(archive_err)?;

        let policy = ResolutionPolicy::with_defaults(&self.host_prefixes);
        let policy = match read_classloader_config(&name, &archive)? {
            Some(properties) => policy.extend_from_properties(&properties),
            None => policy,
        };

        let manifest = ServiceManifest::from_archive(&name, &archive)?;
        let config_files = read_config_files(&name, &archive);

        debug!(
            module = %name,
            body = body.len(),
            dependencies = dependencies.len(),
            config_files = config_files.len(),
            "assembled module"
        );

        let loader = Arc::new(ModuleLoader::new(
            name.clone(),
            body,
            dependencies,
            policy,
            Arc::clone(&self.host),
        ));
        Ok(Module::new(name, archive, loader, manifest, config_files))
    }
}

/// Discovers modules under `root` with the built-in host prefixes only.
pub fn discover(root: &Path, host: Arc<HostNamespace>) -> Vec<Module> {
    Discovery::new(host).discover(Some(root))
}

/// Immediate sub-directories, sorted by name.
fn module_dirs(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// The path the user most likely meant when `root` starts with `~`.
fn home_hint(root: &Path) -> Option<PathBuf> {
    let raw = root.to_str()?.trim();
    let rest = raw.strip_prefix('~')?;
    let home = dirs::home_dir()?;
    Some(home.join(rest.trim_start_matches(['/', '\\'])))
}

fn read_classloader_config(
    module: &str,
    archive: &ModuleArchive,
) -> Result<Option<Properties>, DiscoveryError> {
    let Some(entry) = archive
        .entries()
        .iter()
        .find(|e| e.eq_ignore_ascii_case(CLASSLOADER_CONFIG_FILE))
    else {
        return Ok(None);
    };
    let content = archive
        .read_to_string(entry)
        .map_err(|e| DiscoveryError::ClassloaderConfig {
            module: module.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Some(Properties::parse(&content)))
}

/// Readable files under `config/`. Unreadable ones are logged and skipped.
fn read_config_files(module: &str, archive: &ModuleArchive) -> Vec<ModuleConfigFile> {
    archive
        .entries()
        .iter()
        .filter(|e| e.starts_with(CONFIG_DIR) && !e.ends_with('/'))
        .filter_map(|entry| {
            let format = ConfigFormat::from_file_name(entry)?;
            match archive.read_to_string(entry) {
                Ok(content) => Some(ModuleConfigFile::new(
                    format!("{module}:{entry}"),
                    format,
                    content,
                )),
                Err(e) => {
                    warn!(module = %module, file = %entry, error = %e, "skipping module config file");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use plugboard_test_utils::{ModuleSpec, PluginRoot};
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn home_hint_expands_tilde() {
        let hint = home_hint(Path::new("~/plugins"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(hint, Some(home.join("plugins")));
        }
        assert_eq!(home_hint(Path::new("/srv/plugins")), None);
    }

    #[test]
    fn absent_location_yields_nothing() {
        let discovery = Discovery::new(Arc::new(HostNamespace::new()));
        let report = discovery.discover_with_report(None);
        assert!(report.modules.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    #[traced_test]
    fn broken_module_is_logged_and_skipped() {
        let root = PluginRoot::with_modules([
            ModuleSpec::new("alpha").extension("demo.Greeter", "greeter"),
            ModuleSpec::new("broken").without_body().declare("demo.Ghost"),
        ])
        .unwrap();
        let discovery = Discovery::new(Arc::new(HostNamespace::new()));
        let report = discovery.discover_with_report(Some(root.path()));

        assert_eq!(report.modules.len(), 1);
        assert_eq!(report.modules[0].name(), "alpha");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].module(), "broken");
        assert!(matches!(report.errors[0], DiscoveryError::MissingBody { .. }));
        assert!(logs_contain("failed to load plugin module, skipping"));
    }

    #[test]
    #[traced_test]
    fn tilde_location_logs_hint() {
        let discovery = Discovery::new(Arc::new(HostNamespace::new()));
        let modules = discovery.discover(Some(Path::new("~/plugboard-no-such-dir")));
        assert!(modules.is_empty());
        assert!(logs_contain("plugin location does not exist"));
        if dirs::home_dir().is_some() {
            assert!(logs_contain("only expanded by a shell"));
        }
    }
}
