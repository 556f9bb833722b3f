// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The extension contract and the factory trait that binds exported types to
//! native implementations.

use std::any::Any;

use figment::Figment;
use serde::de::DeserializeOwned;

use crate::error::ExtensionError;
use crate::symbol::TypeHandle;

/// The contract every exported extension implements.
///
/// Lifecycle methods take `&self`; implementations keep any state they build
/// during `init` behind interior mutability. All lifecycle methods default to
/// no-ops.
pub trait Extension: Send + Sync + 'static {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Unique key used for filtering and registration.
    fn key(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Link to the extension's documentation.
    fn doc_url(&self) -> Option<&str> {
        None
    }

    /// Receives the extension's isolated configuration view.
    fn init(&self, _context: &ExtensionContext) -> Result<(), ExtensionError> {
        Ok(())
    }

    fn start(&self) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Called once at host shutdown. Errors are logged, never propagated.
    fn stop(&self) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Access to the concrete type for contract-specific calls.
    fn as_any(&self) -> &dyn Any;
}

/// Constructs the native object behind an exported type.
///
/// The type handle carries the descriptor attributes and its origin module.
pub trait ExtensionFactory: Send + Sync {
    fn create(&self, target: &TypeHandle) -> Result<Box<dyn Extension>, ExtensionError>;
}

impl<F> ExtensionFactory for F
where
    F: Fn(&TypeHandle) -> Result<Box<dyn Extension>, ExtensionError> + Send + Sync,
{
    fn create(&self, target: &TypeHandle) -> Result<Box<dyn Extension>, ExtensionError> {
        self(target)
    }
}

/// What an extension receives in `init`.
#[derive(Debug, Clone)]
pub struct ExtensionContext {
    module: String,
    type_name: String,
    config: Figment,
}

impl ExtensionContext {
    pub fn new(module: impl Into<String>, type_name: impl Into<String>, config: Figment) -> Self {
        Self {
            module: module.into(),
            type_name: type_name.into(),
            config,
        }
    }

    /// Name of the module that exported the extension.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Layered configuration: host sources plus the module's `config/` files.
    pub fn config(&self) -> &Figment {
        &self.config
    }

    /// Extracts the value at a dotted key path.
    #[allow(clippy::result_large_err)]
    pub fn extract<T: DeserializeOwned>(&self, key: &str) -> Result<T, figment::Error> {
        self.config.extract_inner(key)
    }

    /// Extracts the value at `key`, or `None` if it is absent or mistyped.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config.extract_inner(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{TypeDescriptor, TypeOrigin};

    struct Named(&'static str);

    impl Extension for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn key(&self) -> &str {
            self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn closures_are_factories() {
        let factory = |target: &TypeHandle| -> Result<Box<dyn Extension>, ExtensionError> {
            assert_eq!(target.name(), "demo.Named");
            Ok(Box::new(Named("named")))
        };
        let target = TypeHandle::define(
            "demo.Named",
            TypeOrigin::Host,
            vec![],
            TypeDescriptor::default(),
        );
        let ext = factory.create(&target).unwrap();
        assert_eq!(ext.key(), "named");
        assert!(ext.init(&ExtensionContext::new("m", "demo.Named", Figment::new())).is_ok());
        assert!(ext.as_any().downcast_ref::<Named>().is_some());
    }

    #[test]
    fn context_extracts_nested_keys() {
        let config = Figment::from(figment::providers::Serialized::default(
            "greeter",
            toml::toml! { prefix = "hi" },
        ));
        let ctx = ExtensionContext::new("alpha", "demo.Greeter", config);
        let prefix: String = ctx.extract("greeter.prefix").unwrap();
        assert_eq!(prefix, "hi");
        assert_eq!(ctx.get::<String>("greeter.missing"), None);
        assert_eq!(ctx.module(), "alpha");
    }
}
