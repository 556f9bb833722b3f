// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension lifecycle coordination.
//!
//! Each exported type becomes one extension instance that moves through
//! `Discovered -> Configured -> Started -> Stopped`. A failure at any step
//! marks that instance `Failed` and leaves the others untouched. Started
//! instances are stopped in reverse start order on [`shutdown`] or drop.
//!
//! [`shutdown`]: LifecycleCoordinator::shutdown

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use figment::Figment;
use plugboard_config::{ExtensionsConfig, HostConfig};
use plugboard_core::error::panic_message;
use plugboard_core::{Extension, ExtensionContext, InitError, LifecyclePhase, LifecycleState};
use plugboard_loader::{Module, ModuleRegistry, context};
use tracing::{debug, info, warn};

use crate::bindings::BindingTable;
use crate::proxy::ExtensionProxy;

/// One extension instance and where it came from.
#[derive(Debug)]
pub struct ExtensionInstance {
    proxy: ExtensionProxy,
    module: Arc<Module>,
    key: String,
    name: String,
    state: LifecycleState,
}

impl ExtensionInstance {
    pub fn proxy(&self) -> &ExtensionProxy {
        &self.proxy
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        self.proxy.target_type().name()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn summary(&self) -> ExtensionSummary {
        ExtensionSummary {
            key: self.key.clone(),
            name: self.name.clone(),
            type_name: self.type_name().to_string(),
            module: self.module.name().to_string(),
            state: self.state,
        }
    }
}

/// A registered extension as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSummary {
    pub key: String,
    pub name: String,
    pub type_name: String,
    pub module: String,
    pub state: LifecycleState,
}

/// An extension that did not come up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedExtension {
    pub module: String,
    pub type_name: String,
    /// Phase that failed, `None` when instantiation failed.
    pub phase: Option<LifecyclePhase>,
    pub reason: String,
}

impl From<&InitError> for FailedExtension {
    fn from(err: &InitError) -> Self {
        let (phase, reason) = match err {
            InitError::Instantiate { reason, .. } => (None, reason.clone()),
            InitError::Phase { phase, source, .. } => (Some(*phase), source.to_string()),
        };
        Self {
            module: err.module().to_string(),
            type_name: err.type_name().to_string(),
            phase,
            reason,
        }
    }
}

/// Outcome of [`LifecycleCoordinator::startup`].
#[derive(Debug, Clone, Default)]
pub struct StartupReport {
    pub active: Vec<ExtensionSummary>,
    pub failed: Vec<FailedExtension>,
}

impl StartupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives every extension instance through its lifecycle.
pub struct LifecycleCoordinator {
    config: HostConfig,
    filter: ExtensionsConfig,
    bindings: BindingTable,
    instances: Vec<ExtensionInstance>,
    failures: Vec<InitError>,
    /// Indices into `instances`, in start order.
    started: Vec<usize>,
    views: HashMap<String, Figment>,
}

impl LifecycleCoordinator {
    /// Reads the `[extensions]` filter from `config`.
    pub fn new(config: HostConfig, bindings: BindingTable) -> Self {
        let filter = match config.extract() {
            Ok(parsed) => parsed.extensions,
            Err(e) => {
                warn!(error = %e, "could not read extension filter, registering every extension");
                ExtensionsConfig::default()
            }
        };
        Self {
            config,
            filter,
            bindings,
            instances: Vec::new(),
            failures: Vec::new(),
            started: Vec::new(),
            views: HashMap::new(),
        }
    }

    /// Replaces the filter read from configuration.
    pub fn with_filter(mut self, filter: ExtensionsConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn instances(&self) -> &[ExtensionInstance] {
        &self.instances
    }

    /// Instance registered under `key` (case-insensitive).
    pub fn instance(&self, key: &str) -> Option<&ExtensionInstance> {
        self.instances
            .iter()
            .find(|i| i.key.eq_ignore_ascii_case(key))
    }

    pub fn failures(&self) -> &[InitError] {
        &self.failures
    }

    /// Instances currently `Started`.
    pub fn started_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| i.state == LifecycleState::Started)
            .count()
    }

    /// Runs instantiate, configure and start for every exported type.
    pub fn startup(&mut self, registry: &ModuleRegistry) -> StartupReport {
        self.instantiate(registry);
        self.configure_all();
        self.start_all();

        let report = self.report();
        info!(
            active = report.active.len(),
            failed = report.failed.len(),
            "extension startup complete"
        );
        report
    }

    /// Builds one instance per exported type that passes the filter.
    ///
    /// Construction runs under the owning module's namespace.
    pub fn instantiate(&mut self, registry: &ModuleRegistry) {
        for exported in registry.exported_types() {
            let loader = Arc::clone(exported.module.loader());
            // The accessors are extension code too and may panic.
            let created = panic::catch_unwind(AssertUnwindSafe(|| -> Result<_, InitError> {
                let target = {
                    let _guard = context::enter_module(&loader);
                    self.bindings.instantiate(&exported.handle)?
                };
                let proxy = ExtensionProxy::new(target, exported.handle.clone(), Arc::clone(&loader));
                let key = proxy.key().to_string();
                let name = proxy.name().to_string();
                Ok((proxy, key, name))
            }))
            .unwrap_or_else(|payload| {
                Err(InitError::Instantiate {
                    module: exported.module.name().to_string(),
                    type_name: exported.handle.name().to_string(),
                    reason: panic_message(payload.as_ref()),
                })
            });

            let (proxy, key, name) = match created {
                Ok(created) => created,
                Err(e) => {
                    warn!(module = %exported.module.name(), error = %e, "failed to instantiate extension");
                    self.failures.push(e);
                    continue;
                }
            };

            if !self.filter.allows(&key) {
                debug!(key = %key, module = %exported.module.name(), "extension filtered out by configuration");
                continue;
            }
            if self.instance(&key).is_some() {
                warn!(
                    key = %key,
                    module = %exported.module.name(),
                    "duplicate extension key, both instances are kept"
                );
            }
            debug!(key = %key, type_name = %exported.handle.name(), "extension discovered");
            self.instances.push(ExtensionInstance {
                proxy,
                module: exported.module,
                key,
                name,
                state: LifecycleState::Discovered,
            });
        }
    }

    /// Calls `init` on every discovered instance with its module's
    /// configuration view.
    pub fn configure_all(&mut self) {
        let Self {
            config,
            instances,
            failures,
            views,
            ..
        } = self;

        for instance in instances
            .iter_mut()
            .filter(|i| i.state == LifecycleState::Discovered)
        {
            let module = instance.module.name();
            let view = views
                .entry(module.to_string())
                .or_insert_with(|| config.module_view(instance.module.config_files()))
                .clone();
            let context = ExtensionContext::new(module, instance.type_name(), view);

            match instance.proxy.init(&context) {
                Ok(()) => instance.state = LifecycleState::Configured,
                Err(source) => {
                    let err = InitError::Phase {
                        module: module.to_string(),
                        type_name: instance.type_name().to_string(),
                        phase: LifecyclePhase::Init,
                        source,
                    };
                    warn!(key = %instance.key, error = %err, "extension init failed, excluding it");
                    instance.state = LifecycleState::Failed;
                    failures.push(err);
                }
            }
        }
    }

    /// Calls `start` on every configured instance.
    pub fn start_all(&mut self) {
        for (index, instance) in self.instances.iter_mut().enumerate() {
            if instance.state != LifecycleState::Configured {
                continue;
            }
            match instance.proxy.start() {
                Ok(()) => {
                    instance.state = LifecycleState::Started;
                    self.started.push(index);
                    info!(key = %instance.key, module = %instance.module.name(), "extension started");
                }
                Err(source) => {
                    let err = InitError::Phase {
                        module: instance.module.name().to_string(),
                        type_name: instance.type_name().to_string(),
                        phase: LifecyclePhase::Start,
                        source,
                    };
                    warn!(key = %instance.key, error = %err, "extension start failed, excluding it");
                    instance.state = LifecycleState::Failed;
                    self.failures.push(err);
                }
            }
        }
    }

    /// Stops started instances in reverse start order. Stop failures are
    /// logged. Calling this twice is a no-op the second time.
    pub fn shutdown(&mut self) {
        if self.started.is_empty() {
            return;
        }
        info!(count = self.started.len(), "stopping extensions");
        while let Some(index) = self.started.pop() {
            let instance = &mut self.instances[index];
            if let Err(e) = instance.proxy.stop() {
                warn!(
                    key = %instance.key,
                    module = %instance.module.name(),
                    error = %e,
                    "extension stop failed"
                );
            }
            instance.state = LifecycleState::Stopped;
        }
    }

    pub fn report(&self) -> StartupReport {
        StartupReport {
            active: self
                .instances
                .iter()
                .filter(|i| i.state.is_active())
                .map(ExtensionInstance::summary)
                .collect(),
            failed: self.failures.iter().map(FailedExtension::from).collect(),
        }
    }
}

impl Drop for LifecycleCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
