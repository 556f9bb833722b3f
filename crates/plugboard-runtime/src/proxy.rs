// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context-switching wrapper around an extension instance.
//!
//! Every call forwarded through [`ExtensionProxy`] runs with the owning
//! module's namespace active on the calling thread. The previous marker is
//! restored when the call returns, fails or panics.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use plugboard_core::{
    Extension, ExtensionContext, ExtensionError, LifecyclePhase, TypeHandle,
};
use plugboard_loader::{ModuleLoader, context};
use tracing::info;

pub struct ExtensionProxy {
    target: Box<dyn Extension>,
    target_type: TypeHandle,
    loader: Arc<ModuleLoader>,
}

impl ExtensionProxy {
    pub fn new(target: Box<dyn Extension>, target_type: TypeHandle, loader: Arc<ModuleLoader>) -> Self {
        Self {
            target,
            target_type,
            loader,
        }
    }

    pub fn target_type(&self) -> &TypeHandle {
        &self.target_type
    }

    pub fn loader(&self) -> &Arc<ModuleLoader> {
        &self.loader
    }

    /// Name of the module that owns the instance.
    pub fn module_name(&self) -> &str {
        self.loader.module_name()
    }

    /// Runs `f` against the target with the owning module active.
    pub fn invoke<'a, R>(&'a self, f: impl FnOnce(&'a dyn Extension) -> R) -> R {
        let _guard = context::enter_module(&self.loader);
        f(self.target.as_ref())
    }

    /// Runs `f` against the concrete target type, if it is a `T`.
    ///
    /// This is the hook for contract-specific calls beyond the lifecycle.
    pub fn downcast_invoke<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.invoke(|target| target.as_any().downcast_ref::<T>().map(f))
    }

    /// Runs one lifecycle call, turning a panic into an [`ExtensionError`].
    fn lifecycle(
        &self,
        phase: LifecyclePhase,
        call: impl FnOnce(&dyn Extension) -> Result<(), ExtensionError>,
    ) -> Result<(), ExtensionError> {
        info!("LifeCycle {}#{phase}", self.target_type.name());
        panic::catch_unwind(AssertUnwindSafe(|| self.invoke(call)))
            .unwrap_or_else(|payload| Err(ExtensionError::from_panic(payload.as_ref())))
    }
}

impl Extension for ExtensionProxy {
    fn name(&self) -> &str {
        self.invoke(|target| target.name())
    }

    fn key(&self) -> &str {
        self.invoke(|target| target.key())
    }

    fn description(&self) -> Option<&str> {
        self.invoke(|target| target.description())
    }

    fn doc_url(&self) -> Option<&str> {
        self.invoke(|target| target.doc_url())
    }

    fn init(&self, context: &ExtensionContext) -> Result<(), ExtensionError> {
        self.lifecycle(LifecyclePhase::Init, |target| target.init(context))
    }

    fn start(&self) -> Result<(), ExtensionError> {
        self.lifecycle(LifecyclePhase::Start, |target| target.start())
    }

    fn stop(&self) -> Result<(), ExtensionError> {
        self.lifecycle(LifecyclePhase::Stop, |target| target.stop())
    }

    fn as_any(&self) -> &dyn Any {
        self.target.as_any()
    }
}

impl fmt::Debug for ExtensionProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionProxy")
            .field("type", &self.target_type.name())
            .field("module", &self.module_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use plugboard_core::{HostNamespace, TypeDescriptor};
    use plugboard_loader::Discovery;
    use plugboard_test_utils::{ModuleSpec, PluginRoot, Recorder, RecordingExtension};
    use tracing_test::traced_test;

    use super::*;

    fn proxy_for(spec: ModuleSpec, symbol: &str, recorder: &Recorder) -> (PluginRoot, ExtensionProxy) {
        let root = PluginRoot::with_modules([spec]).unwrap();
        let registry = Discovery::new(Arc::new(HostNamespace::new())).build_registry(Some(root.path()));
        let module = registry.modules()[0].clone();
        let handle = module.exported_type(symbol).unwrap().clone();
        let target = RecordingExtension::from_type(&handle, recorder.clone());
        let proxy = ExtensionProxy::new(Box::new(target), handle, module.loader().clone());
        (root, proxy)
    }

    #[test]
    #[traced_test]
    fn calls_run_under_owning_module() {
        let recorder = Recorder::new();
        let (_root, proxy) = proxy_for(
            ModuleSpec::new("alpha").extension("com.alpha.Greeter", "recording"),
            "com.alpha.Greeter",
            &recorder,
        );

        assert!(context::current().is_none());
        proxy.start().unwrap();
        assert!(context::current().is_none());

        let calls = recorder.calls_for("greeter");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].active_module.as_deref(), Some("alpha"));
        assert!(logs_contain("LifeCycle com.alpha.Greeter#start"));
        assert_eq!(proxy.key(), "greeter");
        assert_eq!(proxy.module_name(), "alpha");
    }

    #[test]
    fn error_restores_previous_marker() {
        let recorder = Recorder::new();
        let (_root, proxy) = proxy_for(
            ModuleSpec::new("alpha").extension_with(
                "com.alpha.Greeter",
                TypeDescriptor::implementing(plugboard_core::EXTENSION_CONTRACT)
                    .with_binding("recording")
                    .with_attribute("fail", "start"),
            ),
            "com.alpha.Greeter",
            &recorder,
        );
        let outer = Arc::new(plugboard_loader::ModuleRegistry::empty(Arc::new(HostNamespace::new())));
        let _guard = context::enter(context::ActiveNamespace::Registry(outer.clone()));

        let err = proxy.start().unwrap_err();
        assert_eq!(err.code, "RECORDED_FAILURE");
        let restored = context::current().unwrap();
        assert!(restored.is_same(&context::ActiveNamespace::Registry(outer)));
    }

    #[test]
    fn panic_becomes_extension_error() {
        let recorder = Recorder::new();
        let (_root, proxy) = proxy_for(
            ModuleSpec::new("alpha").extension_with(
                "com.alpha.Greeter",
                TypeDescriptor::implementing(plugboard_core::EXTENSION_CONTRACT)
                    .with_binding("recording")
                    .with_attribute("panic", "stop"),
            ),
            "com.alpha.Greeter",
            &recorder,
        );

        let err = proxy.stop().unwrap_err();
        assert_eq!(err.code, "PANIC");
        assert!(err.message.contains("panicked in stop"));
        assert!(context::current().is_none());
    }

    #[test]
    fn downcast_reaches_concrete_type() {
        let recorder = Recorder::new();
        let (_root, proxy) = proxy_for(
            ModuleSpec::new("alpha").extension("com.alpha.Greeter", "recording"),
            "com.alpha.Greeter",
            &recorder,
        );
        let module = proxy.downcast_invoke::<RecordingExtension, _>(|_| context::current_module());
        assert_eq!(module, Some(Some("alpha".to_string())));
        assert!(proxy.downcast_invoke::<String, _>(|_| ()).is_none());
    }
}
