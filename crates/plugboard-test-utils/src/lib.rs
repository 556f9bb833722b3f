// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plugboard integration tests.
//!
//! - [`PluginRoot`] / [`ModuleSpec`] / [`Bundle`]: temporary plugin roots in
//!   the on-disk module layout, exploded or packaged
//! - [`Recorder`] / [`RecordingFactory`]: extensions that log every lifecycle
//!   call together with the active module

pub mod plugin_root;
pub mod recording;

pub use plugin_root::{Bundle, DEFAULT_SERVICES_FILE, ModuleSpec, PluginRoot};
pub use recording::{CallRecord, Recorder, RecordingExtension, RecordingFactory};
