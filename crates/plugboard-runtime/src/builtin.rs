// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in extension bindings.

use std::any::Any;
use std::sync::{Mutex, PoisonError};

use plugboard_core::{Extension, ExtensionContext, ExtensionError, TypeHandle};
use tracing::info;

/// Binding name of [`LoggingExtension`].
pub const LOGGING_BINDING: &str = "builtin.logging";

/// Logs its type attributes at every lifecycle phase.
///
/// Recognized attributes: `key` (defaults to the lowercased simple type
/// name), `description`, and `message`, which is also looked up in the
/// module's configuration under `<key>.message` during `init`.
#[derive(Debug)]
pub struct LoggingExtension {
    name: String,
    key: String,
    module: String,
    description: Option<String>,
    attributes: String,
    message: Mutex<Option<String>>,
}

impl LoggingExtension {
    pub fn new(target: &TypeHandle) -> Self {
        let attr = |key: &str| {
            target
                .attribute(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let simple = target.name().rsplit('.').next().unwrap_or(target.name());
        Self {
            name: target.name().to_string(),
            key: attr("key").unwrap_or_else(|| simple.to_ascii_lowercase()),
            module: target.module().unwrap_or("host").to_string(),
            description: attr("description"),
            attributes: target.attributes().to_string().trim().replace('\n', ", "),
            message: Mutex::new(attr("message")),
        }
    }

    /// [`ExtensionFactory`](plugboard_core::ExtensionFactory) entry point.
    pub fn factory(target: &TypeHandle) -> Result<Box<dyn Extension>, ExtensionError> {
        Ok(Box::new(Self::new(target)))
    }

    /// The message currently in effect.
    pub fn message(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Extension for LoggingExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn init(&self, context: &ExtensionContext) -> Result<(), ExtensionError> {
        if let Some(message) = context.get::<String>(&format!("{}.message", self.key)) {
            *self.message.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
        }
        info!(
            key = %self.key,
            module = %self.module,
            attributes = %self.attributes,
            "logging extension configured"
        );
        Ok(())
    }

    fn start(&self) -> Result<(), ExtensionError> {
        match self.message() {
            Some(message) => info!(key = %self.key, module = %self.module, "{message}"),
            None => info!(key = %self.key, module = %self.module, "logging extension started"),
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), ExtensionError> {
        info!(key = %self.key, module = %self.module, "logging extension stopped");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
