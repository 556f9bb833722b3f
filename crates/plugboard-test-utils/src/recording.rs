// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extensions that record every lifecycle call they receive.
//!
//! A [`RecordingFactory`] builds a [`RecordingExtension`] for any type handle.
//! The handle's descriptor attributes steer the instance:
//!
//! - `key`: extension key (defaults to the type's simple name, lowercased)
//! - `fail`: phase (`init`, `start`, `stop`) that returns an error
//! - `panic`: phase that panics
//! - `probe`: symbol resolved through the active namespace during `start`
//! - `config_key`: configuration key read during `init`

use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};

use plugboard_core::{
    Extension, ExtensionContext, ExtensionError, ExtensionFactory, LifecyclePhase, TypeHandle,
};
use plugboard_loader::context;

/// One observed lifecycle call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub key: String,
    pub phase: LifecyclePhase,
    /// Module whose namespace was active during the call.
    pub active_module: Option<String>,
    /// Result of the `probe` lookup, for `start` calls.
    pub resolved: Option<TypeHandle>,
    /// Value of `config_key`, for `init` calls.
    pub config_value: Option<String>,
}

/// Shared call log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<CallRecord>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Calls received by the extension with `key`, in order.
    pub fn calls_for(&self, key: &str) -> Vec<CallRecord> {
        self.calls().into_iter().filter(|c| c.key == key).collect()
    }

    pub fn phases_for(&self, key: &str) -> Vec<LifecyclePhase> {
        self.calls_for(key).into_iter().map(|c| c.phase).collect()
    }

    pub fn factory(&self) -> RecordingFactory {
        RecordingFactory {
            recorder: self.clone(),
        }
    }

    fn record(&self, call: CallRecord) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

/// Builds recording extensions from type attributes.
#[derive(Debug, Clone)]
pub struct RecordingFactory {
    recorder: Recorder,
}

impl ExtensionFactory for RecordingFactory {
    fn create(&self, target: &TypeHandle) -> Result<Box<dyn Extension>, ExtensionError> {
        Ok(Box::new(RecordingExtension::from_type(
            target,
            self.recorder.clone(),
        )))
    }
}

pub struct RecordingExtension {
    name: String,
    key: String,
    fail: Option<LifecyclePhase>,
    panic: Option<LifecyclePhase>,
    probe: Option<String>,
    config_key: Option<String>,
    recorder: Recorder,
}

impl RecordingExtension {
    pub fn from_type(target: &TypeHandle, recorder: Recorder) -> Self {
        let attr = |key: &str| {
            target
                .attribute(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let phase = |key: &str| attr(key).and_then(|p| p.parse::<LifecyclePhase>().ok());
        let simple = target.name().rsplit('.').next().unwrap_or(target.name());

        Self {
            name: target.name().to_string(),
            key: attr("key").unwrap_or_else(|| simple.to_ascii_lowercase()),
            fail: phase("fail"),
            panic: phase("panic"),
            probe: attr("probe"),
            config_key: attr("config_key"),
            recorder,
        }
    }

    fn call(
        &self,
        phase: LifecyclePhase,
        context: Option<&ExtensionContext>,
    ) -> Result<(), ExtensionError> {
        let resolved = match (&self.probe, phase) {
            (Some(probe), LifecyclePhase::Start) => context::resolve(probe).ok(),
            _ => None,
        };
        let config_value = match (&self.config_key, context) {
            (Some(key), Some(ctx)) => ctx.get::<String>(key),
            _ => None,
        };
        self.recorder.record(CallRecord {
            key: self.key.clone(),
            phase,
            active_module: context::current_module(),
            resolved,
            config_value,
        });

        if self.panic == Some(phase) {
            panic!("{} panicked in {phase}", self.key);
        }
        if self.fail == Some(phase) {
            return Err(ExtensionError::new(
                "RECORDED_FAILURE",
                format!("{} failed in {phase}", self.key),
            ));
        }
        Ok(())
    }
}

impl Extension for RecordingExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn init(&self, context: &ExtensionContext) -> Result<(), ExtensionError> {
        self.call(LifecyclePhase::Init, Some(context))
    }

    fn start(&self) -> Result<(), ExtensionError> {
        self.call(LifecyclePhase::Start, None)
    }

    fn stop(&self) -> Result<(), ExtensionError> {
        self.call(LifecyclePhase::Stop, None)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
