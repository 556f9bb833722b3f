// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The host namespace: the application's own symbol table, consulted by
//! module loaders for host-forced prefixes and as a last resort.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::error::ResolveError;
use crate::symbol::{Resource, TypeDescriptor, TypeHandle, TypeOrigin};
use crate::traits::Namespace;
use crate::types::EXTENSION_CONTRACT;

/// Symbol table of the hosting application.
///
/// Always contains the base extension contract. Host types resolve their
/// `implements` lists against already-defined host types only.
pub struct HostNamespace {
    contract: TypeHandle,
    types: RwLock<HashMap<String, TypeHandle>>,
    resources: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl HostNamespace {
    pub fn new() -> Self {
        let contract = TypeHandle::define(
            EXTENSION_CONTRACT,
            TypeOrigin::Host,
            vec![],
            TypeDescriptor::default(),
        );
        let mut types = HashMap::new();
        types.insert(EXTENSION_CONTRACT.to_string(), contract.clone());
        Self {
            contract,
            types: RwLock::new(types),
            resources: RwLock::new(BTreeMap::new()),
        }
    }

    /// The base extension contract every exported type must implement.
    pub fn extension_contract(&self) -> TypeHandle {
        self.contract.clone()
    }

    /// Defines a host type. Defining an existing name returns the existing
    /// handle so the host never ends up with two types of the same name.
    pub fn define(
        &self,
        name: &str,
        descriptor: TypeDescriptor,
    ) -> Result<TypeHandle, ResolveError> {
        if let Some(existing) = self.lookup(name) {
            debug!(symbol = name, "host type already defined");
            return Ok(existing);
        }

        let interfaces = descriptor
            .implements
            .iter()
            .map(|iface| self.lookup(iface).ok_or_else(|| ResolveError::not_found(iface)))
            .collect::<Result<Vec<_>, _>>()?;

        let handle = TypeHandle::define(name, TypeOrigin::Host, interfaces, descriptor);
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        Ok(types.entry(name.to_string()).or_insert(handle).clone())
    }

    pub fn lookup(&self, name: &str) -> Option<TypeHandle> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registers a host resource.
    pub fn add_resource(&self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), data.into());
    }

    /// All defined type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for HostNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostNamespace")
            .field("types", &self.type_names())
            .finish()
    }
}

impl Namespace for HostNamespace {
    fn resolve(&self, name: &str) -> Result<TypeHandle, ResolveError> {
        self.lookup(name).ok_or_else(|| ResolveError::not_found(name))
    }

    fn find_resource(&self, name: &str) -> Option<Resource> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|data| Resource::new(name, format!("host:{name}"), data.clone()))
    }

    fn find_resources(&self, name: &str) -> Vec<Resource> {
        self.find_resource(name).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_is_predefined() {
        let host = HostNamespace::new();
        let contract = host.resolve(EXTENSION_CONTRACT).unwrap();
        assert_eq!(contract, host.extension_contract());
        assert!(contract.is_host_type());
    }

    #[test]
    fn define_resolves_interfaces_against_host() {
        let host = HostNamespace::new();
        let greeter = host
            .define("demo.Greeter", TypeDescriptor::implementing(EXTENSION_CONTRACT))
            .unwrap();
        assert!(greeter.is_assignable_to(&host.extension_contract()));
    }

    #[test]
    fn define_with_unknown_interface_fails() {
        let host = HostNamespace::new();
        let err = host
            .define("demo.Broken", TypeDescriptor::implementing("demo.Missing"))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(host.lookup("demo.Broken").is_none());
    }

    #[test]
    fn redefinition_returns_same_handle() {
        let host = HostNamespace::new();
        let first = host.define("shared.util.Helper", TypeDescriptor::default()).unwrap();
        let second = host.define("shared.util.Helper", TypeDescriptor::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn resources_are_addressable() {
        let host = HostNamespace::new();
        host.add_resource("banner.txt", "hello");
        let res = host.find_resource("banner.txt").unwrap();
        assert_eq!(res.as_str().unwrap(), "hello");
        assert_eq!(res.location(), "host:banner.txt");
        assert_eq!(host.find_resources("banner.txt").len(), 1);
        assert!(host.find_resource("missing").is_none());
    }
}
