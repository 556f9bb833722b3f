// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The merged namespace of all discovered modules.
//!
//! Type lookup goes to the first module, in discovery order, that exports
//! the name. Resource lookup walks every module's own loader. The registry is
//! immutable once built.

use std::fmt;
use std::sync::Arc;

use plugboard_core::{HostNamespace, Namespace, Resource, ResolveError, TypeHandle};

use crate::module::Module;

/// An exported type together with the module that exports it.
#[derive(Debug, Clone)]
pub struct ExportedType {
    pub module: Arc<Module>,
    pub handle: TypeHandle,
}

pub struct ModuleRegistry {
    host: Arc<HostNamespace>,
    modules: Vec<Arc<Module>>,
}

impl ModuleRegistry {
    /// Builds the registry and forces every module's export, so the registry
    /// is complete before anyone queries it.
    pub fn new(host: Arc<HostNamespace>, modules: Vec<Module>) -> Self {
        let modules: Vec<Arc<Module>> = modules.into_iter().map(Arc::new).collect();
        for module in &modules {
            module.exports();
        }
        Self { host, modules }
    }

    pub fn empty(host: Arc<HostNamespace>) -> Self {
        Self::new(host, Vec::new())
    }

    pub fn host(&self) -> &Arc<HostNamespace> {
        &self.host
    }

    /// Modules in discovery order.
    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Arc<Module>> {
        self.modules.iter().find(|m| m.name() == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Every exported type, module by module.
    pub fn exported_types(&self) -> Vec<ExportedType> {
        self.modules
            .iter()
            .flat_map(|module| {
                module.exports().values().map(|handle| ExportedType {
                    module: Arc::clone(module),
                    handle: handle.clone(),
                })
            })
            .collect()
    }

    /// First module whose exports contain `name`.
    pub fn find_type(&self, name: &str) -> Result<TypeHandle, ResolveError> {
        self.modules
            .iter()
            .find_map(|m| m.exported_type(name).cloned())
            .ok_or_else(|| ResolveError::not_found(name))
    }

    /// First hit across the module loaders.
    pub fn find_resource(&self, name: &str) -> Option<Resource> {
        self.modules
            .iter()
            .find_map(|m| m.loader().find_resource(name))
    }

    /// All hits across the module loaders, in discovery order.
    pub fn find_all_resources(&self, name: &str) -> Vec<Resource> {
        self.modules
            .iter()
            .flat_map(|m| m.loader().find_resources(name))
            .collect()
    }
}

impl Namespace for ModuleRegistry {
    /// Host types first, then module exports.
    fn resolve(&self, name: &str) -> Result<TypeHandle, ResolveError> {
        match self.host.lookup(name) {
            Some(handle) => Ok(handle),
            None => self.find_type(name),
        }
    }

    fn find_resource(&self, name: &str) -> Option<Resource> {
        self.host
            .find_resource(name)
            .or_else(|| ModuleRegistry::find_resource(self, name))
    }

    fn find_resources(&self, name: &str) -> Vec<Resource> {
        let mut all = self.host.find_resources(name);
        all.extend(self.find_all_resources(name));
        all
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
