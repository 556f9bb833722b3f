// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A discovered module: its archive, loader, manifest and exported types.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use plugboard_config::ModuleConfigFile;
use plugboard_core::TypeHandle;

use crate::archive::ModuleArchive;
use crate::exporter::{ServiceExporter, ServiceManifest};
use crate::loader::ModuleLoader;

pub struct Module {
    name: String,
    archive: ModuleArchive,
    loader: Arc<ModuleLoader>,
    manifest: ServiceManifest,
    config_files: Vec<ModuleConfigFile>,
    exports: OnceLock<BTreeMap<String, TypeHandle>>,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        archive: ModuleArchive,
        loader: Arc<ModuleLoader>,
        manifest: ServiceManifest,
        config_files: Vec<ModuleConfigFile>,
    ) -> Self {
        Self {
            name: name.into(),
            archive,
            loader,
            manifest,
            config_files,
            exports: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module directory.
    pub fn archive(&self) -> &ModuleArchive {
        &self.archive
    }

    pub fn loader(&self) -> &Arc<ModuleLoader> {
        &self.loader
    }

    pub fn manifest(&self) -> &ServiceManifest {
        &self.manifest
    }

    /// Files from the module's `config/` directory, in entry order.
    pub fn config_files(&self) -> &[ModuleConfigFile] {
        &self.config_files
    }

    /// Exported extension types. Computed on first call and never again.
    pub fn exports(&self) -> &BTreeMap<String, TypeHandle> {
        self.exports
            .get_or_init(|| ServiceExporter::new(&self.loader, &self.manifest).export())
    }

    pub fn exported_type(&self, name: &str) -> Option<&TypeHandle> {
        self.exports().get(name)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("archive", &self.archive.location())
            .field("declared", &self.manifest.len())
            .field("exported", &self.exports.get().map(BTreeMap::len))
            .finish()
    }
}
