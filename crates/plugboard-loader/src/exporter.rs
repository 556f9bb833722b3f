// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service manifests and the export of extension types.
//!
//! Every file under a module's `services/` directory lists one qualified type
//! name per line. The exporter resolves each name through the module's own
//! loader and keeps the ones assignable to the extension contract.

use std::collections::BTreeMap;

use plugboard_core::{DiscoveryError, Namespace, ResolveError, TypeHandle};
use tracing::{debug, warn};

use crate::archive::ModuleArchive;
use crate::loader::ModuleLoader;

/// Directory holding the service manifest files.
pub const SERVICES_DIR: &str = "services/";

/// A type name a module declares as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    pub name: String,
    /// Manifest file that declared it, e.g. `services/plugboard.spi.Extension`.
    pub declared_in: String,
}

/// The merged manifest of one module, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceManifest {
    descriptors: Vec<ExtensionDescriptor>,
}

impl ServiceManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every file under `services/` in entry order.
    pub fn from_archive(module: &str, archive: &ModuleArchive) -> Result<Self, DiscoveryError> {
        let mut manifest = Self::new();
        let files = archive
            .entries()
            .iter()
            .filter(|e| e.starts_with(SERVICES_DIR) && !e.ends_with('/'));
        for file in files {
            let content = archive
                .read_to_string(file)
                .map_err(|e| DiscoveryError::Manifest {
                    module: module.to_string(),
                    file: file.clone(),
                    reason: e.to_string(),
                })?;
            manifest.add_file(file, &content);
        }
        Ok(manifest)
    }

    /// Adds the names listed in one manifest file. Blank lines and `#`
    /// comments are ignored; names already declared are skipped.
    pub fn add_file(&mut self, file: &str, content: &str) {
        for line in content.lines() {
            let name = line.split('#').next().unwrap_or_default().trim();
            if !name.is_empty() {
                self.add(name, file);
            }
        }
    }

    /// Returns false if the name was already declared.
    pub fn add(&mut self, name: impl Into<String>, declared_in: impl Into<String>) -> bool {
        let name = name.into();
        if self.descriptors.iter().any(|d| d.name == name) {
            return false;
        }
        self.descriptors.push(ExtensionDescriptor {
            name,
            declared_in: declared_in.into(),
        });
        true
    }

    pub fn descriptors(&self) -> &[ExtensionDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Resolves a module's declared names into exported extension types.
pub struct ServiceExporter<'a> {
    loader: &'a ModuleLoader,
    manifest: &'a ServiceManifest,
}

impl<'a> ServiceExporter<'a> {
    pub fn new(loader: &'a ModuleLoader, manifest: &'a ServiceManifest) -> Self {
        Self { loader, manifest }
    }

    /// Exported types keyed by name. Names that do not resolve, or resolve to
    /// something that is not an extension, are skipped.
    pub fn export(&self) -> BTreeMap<String, TypeHandle> {
        let module = self.loader.module_name();
        let contract = self.loader.host().extension_contract();
        let mut exported = BTreeMap::new();

        for descriptor in self.manifest.descriptors() {
            match self.loader.resolve(&descriptor.name) {
                Ok(handle) if handle.is_assignable_to(&contract) => {
                    debug!(module = %module, symbol = %descriptor.name, "exported extension type");
                    exported.insert(descriptor.name.clone(), handle);
                }
                Ok(_) => {
                    debug!(
                        module = %module,
                        symbol = %descriptor.name,
                        declared_in = %descriptor.declared_in,
                        "declared type is not an extension, skipping"
                    );
                }
                Err(ResolveError::NotFound { .. }) => {
                    debug!(
                        module = %module,
                        symbol = %descriptor.name,
                        declared_in = %descriptor.declared_in,
                        "declared type not found, skipping"
                    );
                }
                Err(e) => {
                    warn!(
                        module = %module,
                        symbol = %descriptor.name,
                        error = %e,
                        "declared type failed to resolve, skipping"
                    );
                }
            }
        }
        exported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lines_are_trimmed_and_deduplicated() {
        let mut manifest = ServiceManifest::new();
        manifest.add_file(
            "services/plugboard.spi.Extension",
            "# header\n  demo.Greeter  \n\ndemo.Other # trailing\ndemo.Greeter\n",
        );
        manifest.add_file("services/other", "demo.Other\ndemo.Third\n");

        let names: Vec<&str> = manifest.names().collect();
        assert_eq!(names, vec!["demo.Greeter", "demo.Other", "demo.Third"]);
        assert_eq!(manifest.descriptors()[2].declared_in, "services/other");
    }

    #[test]
    fn empty_manifest() {
        let mut manifest = ServiceManifest::new();
        manifest.add_file("services/x", "\n# nothing\n");
        assert!(manifest.is_empty());
        assert_eq!(manifest.len(), 0);
    }
}
