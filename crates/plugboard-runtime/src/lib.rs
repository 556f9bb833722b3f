// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime side of Plugboard: turning exported types into running
//! extensions.
//!
//! - [`BindingTable`] maps descriptor bindings to native factories
//! - [`ExtensionProxy`] switches the active module around every call
//! - [`LifecycleCoordinator`] drives init, start and stop
//! - [`RelaunchBootstrap`] and [`ExecutionGroup`] implement two-phase startup

pub mod banner;
pub mod bindings;
pub mod builtin;
pub mod group;
pub mod lifecycle;
pub mod proxy;
pub mod relaunch;

pub use bindings::BindingTable;
pub use builtin::{LOGGING_BINDING, LoggingExtension};
pub use group::ExecutionGroup;
pub use lifecycle::{
    ExtensionInstance, ExtensionSummary, FailedExtension, LifecycleCoordinator, StartupReport,
};
pub use proxy::ExtensionProxy;
pub use relaunch::{LaunchContext, LaunchOutcome, RelaunchBootstrap, RelaunchMarker, RelaunchState};
