// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-module symbol loader.
//!
//! A [`ModuleLoader`] owns the module's private code locations (body first,
//! then `lib/` dependencies) and resolves names through its
//! [`ResolutionPolicy`]. Types defined from its locations are cached, so the
//! same name always yields the same handle from the same loader.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use plugboard_core::symbol::{entry_symbol_name, symbol_entry_name};
use plugboard_core::{
    ArchiveError, HostNamespace, Namespace, Resource, ResolveError, TypeDescriptor, TypeHandle,
    TypeOrigin,
};
use tracing::{debug, trace};

use crate::archive::ModuleArchive;
use crate::policy::{ResolutionPolicy, Source};

pub struct ModuleLoader {
    module: String,
    locations: Vec<ModuleArchive>,
    body_count: usize,
    policy: ResolutionPolicy,
    host: Arc<HostNamespace>,
    cache: Mutex<HashMap<String, TypeHandle>>,
}

impl ModuleLoader {
    /// Creates a loader over `body` followed by `dependencies`.
    ///
    /// Overlapping prefixes in `policy` are logged once here.
    pub fn new(
        module: impl Into<String>,
        body: Vec<ModuleArchive>,
        dependencies: Vec<ModuleArchive>,
        policy: ResolutionPolicy,
        host: Arc<HostNamespace>,
    ) -> Self {
        let module = module.into();
        policy.warn_overlaps(&module);
        let body_count = body.len();
        let mut locations = body;
        locations.extend(dependencies);
        Self {
            module,
            locations,
            body_count,
            policy,
            host,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// All private locations in lookup order.
    pub fn locations(&self) -> &[ModuleArchive] {
        &self.locations
    }

    pub fn body(&self) -> &[ModuleArchive] {
        &self.locations[..self.body_count]
    }

    pub fn dependencies(&self) -> &[ModuleArchive] {
        &self.locations[self.body_count..]
    }

    pub fn dependency_count(&self) -> usize {
        self.locations.len() - self.body_count
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    pub fn host(&self) -> &Arc<HostNamespace> {
        &self.host
    }

    /// Whether `name` was already defined by this loader.
    pub fn is_defined(&self, name: &str) -> bool {
        self.lock_cache().contains_key(name)
    }

    /// Names of every type this loader has defined so far, sorted.
    pub fn defined_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_cache().keys().cloned().collect();
        names.sort();
        names
    }

    /// Every symbol declared by the private locations, in lookup order.
    pub fn declared_symbols(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for location in &self.locations {
            for symbol in location.entries().iter().filter_map(|e| entry_symbol_name(e)) {
                if !seen.contains(&symbol) {
                    seen.push(symbol);
                }
            }
        }
        seen
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, TypeHandle>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, name: &str) -> Option<TypeHandle> {
        self.lock_cache().get(name).cloned()
    }

    fn resolve_in_chain(
        &self,
        name: &str,
        chain: &mut Vec<String>,
    ) -> Result<TypeHandle, ResolveError> {
        if let Some(handle) = self.cached(name) {
            return Ok(handle);
        }
        for source in self.policy.lookup_order(name) {
            let found = match source {
                Source::Module => self.define_local(name, chain)?,
                Source::Host => self.host.lookup(name),
            };
            if let Some(handle) = found {
                trace!(module = %self.module, symbol = name, source = ?source, "resolved");
                return Ok(handle);
            }
        }
        Err(ResolveError::not_found(name))
    }

    /// Defines `name` from the first private location that declares it.
    /// `Ok(None)` when no location does.
    fn define_local(
        &self,
        name: &str,
        chain: &mut Vec<String>,
    ) -> Result<Option<TypeHandle>, ResolveError> {
        let entry = symbol_entry_name(name);
        let Some(location) = self.locations.iter().find(|l| l.contains(&entry)) else {
            return Ok(None);
        };

        if chain.iter().any(|n| n == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(ResolveError::Circular { chain: cycle });
        }

        let content = location
            .read_to_string(&entry)
            .map_err(|e| match e {
                ArchiveError::Io { source, .. } => ResolveError::Io {
                    name: name.to_string(),
                    location: location.location().to_string(),
                    source,
                },
                other => ResolveError::Malformed {
                    name: name.to_string(),
                    location: location.location().to_string(),
                    reason: other.to_string(),
                },
            })?;
        let descriptor = TypeDescriptor::parse(&content).map_err(|e| ResolveError::Malformed {
            name: name.to_string(),
            location: location.location().to_string(),
            reason: e.message().to_string(),
        })?;

        // The cache lock is not held here: interface resolution recurses.
        chain.push(name.to_string());
        let interfaces: Result<Vec<TypeHandle>, ResolveError> = descriptor
            .implements
            .iter()
            .map(|iface| {
                self.resolve_in_chain(iface, chain).map_err(|e| match e {
                    ResolveError::NotFound { name: missing } => ResolveError::Malformed {
                        name: name.to_string(),
                        location: location.location().to_string(),
                        reason: format!("implements unknown type {missing}"),
                    },
                    other => other,
                })
            })
            .collect();
        chain.pop();
        let interfaces = interfaces?;

        let handle = TypeHandle::define(
            name,
            TypeOrigin::Module {
                module: self.module.clone(),
                location: location.location().to_string(),
            },
            interfaces,
            descriptor,
        );

        // First insert wins if another thread defined the same name meanwhile.
        let mut cache = self.lock_cache();
        let handle = cache.entry(name.to_string()).or_insert(handle).clone();
        debug!(module = %self.module, symbol = name, location = %location.location(), "defined type");
        Ok(Some(handle))
    }

    fn resource_at(&self, location: &ModuleArchive, name: &str) -> Option<Resource> {
        if name.ends_with('/') || !location.contains(name) {
            return None;
        }
        match location.read(name) {
            Ok(data) => Some(Resource::new(
                name,
                format!("{}!/{name}", location.location()),
                data,
            )),
            Err(e) => {
                debug!(module = %self.module, resource = name, error = %e, "unreadable resource");
                None
            }
        }
    }
}

impl Namespace for ModuleLoader {
    fn resolve(&self, name: &str) -> Result<TypeHandle, ResolveError> {
        self.resolve_in_chain(name, &mut Vec::new())
    }

    fn find_resource(&self, name: &str) -> Option<Resource> {
        self.locations
            .iter()
            .find_map(|location| self.resource_at(location, name))
    }

    fn find_resources(&self, name: &str) -> Vec<Resource> {
        self.locations
            .iter()
            .filter_map(|location| self.resource_at(location, name))
            .collect()
    }
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("module", &self.module)
            .field(
                "locations",
                &self.locations.iter().map(|l| l.location()).collect::<Vec<_>>(),
            )
            .field("dependencies", &self.dependency_count())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use plugboard_core::EXTENSION_CONTRACT;

    use super::*;

    fn write_type(root: &Path, symbol: &str, content: &str) {
        let path = root.join(symbol_entry_name(symbol));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn loader(dir: &Path, policy: ResolutionPolicy, host: Arc<HostNamespace>) -> ModuleLoader {
        let body = ModuleArchive::open(dir.join("classes")).unwrap();
        let libs = if dir.join("lib").exists() {
            vec![ModuleArchive::open(dir.join("lib")).unwrap()]
        } else {
            vec![]
        };
        ModuleLoader::new("alpha", vec![body], libs, policy, host)
    }

    #[test]
    fn defines_module_types_once() {
        let dir = tempfile::tempdir().unwrap();
        write_type(
            &dir.path().join("classes"),
            "demo.Greeter",
            &format!("implements = [\"{EXTENSION_CONTRACT}\"]"),
        );
        let host = Arc::new(HostNamespace::new());
        let loader = loader(dir.path(), ResolutionPolicy::with_defaults(&[]), host.clone());

        let first = loader.resolve("demo.Greeter").unwrap();
        let second = loader.resolve("demo.Greeter").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.module(), Some("alpha"));
        assert!(first.is_assignable_to(&host.extension_contract()));
        assert_eq!(loader.defined_types(), vec!["demo.Greeter"]);
    }

    #[test]
    fn concurrent_resolution_shares_one_handle() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        write_type(&classes, "demo.Base", "");
        write_type(&classes, "demo.Greeter", "implements = [\"demo.Base\"]");
        let loader = loader(
            dir.path(),
            ResolutionPolicy::with_defaults(&[]),
            Arc::new(HostNamespace::new()),
        );

        let handles: Vec<TypeHandle> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| loader.resolve("demo.Greeter").unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let first = loader.resolve("demo.Greeter").unwrap();
        for handle in &handles {
            assert!(handle.same_type(&first));
        }
        assert!(first.interfaces()[0].same_type(&loader.resolve("demo.Base").unwrap()));
    }

    #[test]
    fn host_forced_prefix_prefers_host_copy() {
        let dir = tempfile::tempdir().unwrap();
        write_type(&dir.path().join("classes"), "shared.util.Helper", "");
        let host = Arc::new(HostNamespace::new());
        let host_helper = host
            .define("shared.util.Helper", TypeDescriptor::default())
            .unwrap();

        let pinned = loader(
            dir.path(),
            ResolutionPolicy::with_defaults(&["shared.util.".to_string()]),
            host.clone(),
        );
        assert_eq!(pinned.resolve("shared.util.Helper").unwrap(), host_helper);

        let private = loader(dir.path(), ResolutionPolicy::with_defaults(&[]), host);
        let own = private.resolve("shared.util.Helper").unwrap();
        assert_ne!(own, host_helper);
        assert_eq!(own.module(), Some("alpha"));
    }

    #[test]
    fn module_forced_prefix_pins_private_copy() {
        let dir = tempfile::tempdir().unwrap();
        write_type(&dir.path().join("classes"), "tracing.Span", "");
        let host = Arc::new(HostNamespace::new());
        let host_span = host.define("tracing.Span", TypeDescriptor::default()).unwrap();

        let policy = ResolutionPolicy::new(
            plugboard_core::DEFAULT_HOST_PREFIXES.iter().copied(),
            ["tracing."],
        );
        let loader = loader(dir.path(), policy, host);
        let span = loader.resolve("tracing.Span").unwrap();
        assert_ne!(span, host_span);
        assert!(!span.is_host_type());
    }

    #[test]
    fn falls_back_to_host_and_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("classes")).unwrap();
        let host = Arc::new(HostNamespace::new());
        host.define("app.Service", TypeDescriptor::default()).unwrap();
        let loader = loader(dir.path(), ResolutionPolicy::with_defaults(&[]), host);

        assert!(loader.resolve("app.Service").unwrap().is_host_type());
        assert!(loader.resolve("app.Missing").unwrap_err().is_not_found());
    }

    #[test]
    fn body_shadows_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        write_type(&dir.path().join("classes"), "demo.Dup", "binding = \"body\"");
        write_type(&dir.path().join("lib"), "demo.Dup", "binding = \"lib\"");
        write_type(&dir.path().join("lib"), "demo.LibOnly", "");
        let loader = loader(
            dir.path(),
            ResolutionPolicy::with_defaults(&[]),
            Arc::new(HostNamespace::new()),
        );
        assert_eq!(loader.resolve("demo.Dup").unwrap().binding(), Some("body"));
        assert!(loader.resolve("demo.LibOnly").is_ok());
        assert_eq!(loader.dependency_count(), 1);
        assert_eq!(loader.declared_symbols(), vec!["demo.Dup", "demo.LibOnly"]);
    }

    #[test]
    fn cycles_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        write_type(&classes, "demo.A", "implements = [\"demo.B\"]");
        write_type(&classes, "demo.B", "implements = [\"demo.A\"]");
        let loader = loader(
            dir.path(),
            ResolutionPolicy::with_defaults(&[]),
            Arc::new(HostNamespace::new()),
        );
        match loader.resolve("demo.A").unwrap_err() {
            ResolveError::Circular { chain } => {
                assert_eq!(chain, vec!["demo.A", "demo.B", "demo.A"]);
            }
            other => panic!("expected cycle, got {other}"),
        }
        assert!(!loader.is_defined("demo.A"));
    }

    #[test]
    fn malformed_descriptors_and_unknown_interfaces() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        write_type(&classes, "demo.Bad", "implements = 3");
        write_type(&classes, "demo.Orphan", "implements = [\"demo.Nowhere\"]");
        let loader = loader(
            dir.path(),
            ResolutionPolicy::with_defaults(&[]),
            Arc::new(HostNamespace::new()),
        );
        assert!(matches!(
            loader.resolve("demo.Bad"),
            Err(ResolveError::Malformed { .. })
        ));
        let err = loader.resolve("demo.Orphan").unwrap_err();
        assert!(err.to_string().contains("demo.Nowhere"));
    }

    #[test]
    fn resources_come_from_private_locations() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("classes")).unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("classes/app.txt"), "body").unwrap();
        fs::write(dir.path().join("lib/app.txt"), "lib").unwrap();
        let loader = loader(
            dir.path(),
            ResolutionPolicy::with_defaults(&[]),
            Arc::new(HostNamespace::new()),
        );

        let first = loader.find_resource("app.txt").unwrap();
        assert_eq!(first.as_str().unwrap(), "body");
        assert!(first.location().ends_with("classes!/app.txt"));
        let all = loader.find_resources("app.txt");
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].as_str().unwrap(), "lib");
        assert!(loader.find_resource("none.txt").is_none());
    }
}
