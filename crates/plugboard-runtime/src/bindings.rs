// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binding table: maps the `binding` named in a type descriptor to the
//! factory that builds the native extension object.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use plugboard_core::{Extension, ExtensionFactory, InitError, TypeHandle};

use crate::builtin::{LOGGING_BINDING, LoggingExtension};

/// Registered extension factories keyed by binding name.
#[derive(Clone, Default)]
pub struct BindingTable {
    factories: HashMap<String, Arc<dyn ExtensionFactory>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the runtime's built-in bindings.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register(LOGGING_BINDING, LoggingExtension::factory);
        table
    }

    /// Registers `factory` under `binding`, replacing any earlier one.
    pub fn register(&mut self, binding: impl Into<String>, factory: impl ExtensionFactory + 'static) {
        self.factories.insert(binding.into(), Arc::new(factory));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, binding: impl Into<String>, factory: impl ExtensionFactory + 'static) -> Self {
        self.register(binding, factory);
        self
    }

    pub fn get(&self, binding: &str) -> Option<Arc<dyn ExtensionFactory>> {
        self.factories.get(binding).cloned()
    }

    pub fn contains(&self, binding: &str) -> bool {
        self.factories.contains_key(binding)
    }

    /// Binding names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Builds the native object for `target` through its binding.
    ///
    /// Does not switch the active-module marker; callers that build on behalf
    /// of a module do that around this call.
    pub fn instantiate(&self, target: &TypeHandle) -> Result<Box<dyn Extension>, InitError> {
        let instantiate_err = |reason: String| InitError::Instantiate {
            module: target.module().unwrap_or("host").to_string(),
            type_name: target.name().to_string(),
            reason,
        };

        let binding = target
            .binding()
            .ok_or_else(|| instantiate_err("type descriptor names no binding".into()))?;
        let factory = self
            .factories
            .get(binding)
            .ok_or_else(|| instantiate_err(format!("unknown binding '{binding}'")))?;
        factory
            .create(target)
            .map_err(|e| instantiate_err(e.to_string()))
    }
}

impl fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("bindings", &self.names())
            .finish()
    }
}
