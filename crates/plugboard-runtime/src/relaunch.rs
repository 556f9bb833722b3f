// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase startup.
//!
//! The first call to [`RelaunchBootstrap::launch`] builds the module
//! registry, then runs the entry point again on a fresh execution group with
//! the registry as the active namespace. Any later call sees the process
//! marker already set and returns immediately, so an entry point that goes
//! through the bootstrap itself does not loop.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use plugboard_core::{BoxError, RelaunchFailure};
use plugboard_loader::context::ActiveNamespace;
use plugboard_loader::{Discovery, ModuleRegistry};
use tracing::{debug, info};

use crate::group::ExecutionGroup;

/// Name of the execution group created by a relaunch.
pub const RELAUNCH_GROUP: &str = "plugboard-relaunch";
/// Name of the unit that runs the entry point.
pub const MAIN_UNIT: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaunchState {
    NotRelaunched,
    Relaunching,
    Relaunched,
}

/// Process-scoped record of whether the relaunch already happened.
#[derive(Debug)]
pub struct RelaunchMarker {
    state: Mutex<RelaunchState>,
}

impl RelaunchMarker {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RelaunchState::NotRelaunched),
        }
    }

    /// The marker shared by the whole process.
    pub fn global() -> Arc<RelaunchMarker> {
        static GLOBAL: OnceLock<Arc<RelaunchMarker>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(RelaunchMarker::new())))
    }

    pub fn state(&self) -> RelaunchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `NotRelaunched -> Relaunching`. False if that already happened.
    fn begin(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != RelaunchState::NotRelaunched {
            return false;
        }
        *state = RelaunchState::Relaunching;
        true
    }

    fn finish(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = RelaunchState::Relaunched;
    }
}

impl Default for RelaunchMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// What the relaunched entry point receives.
pub struct LaunchContext {
    pub args: Vec<String>,
    pub registry: Arc<ModuleRegistry>,
    /// The group the entry point runs in; further units go here.
    pub group: ExecutionGroup,
}

impl fmt::Debug for LaunchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchContext")
            .field("args", &self.args)
            .field("modules", &self.registry.len())
            .field("group", &self.group)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The relaunch already happened; nothing was done.
    AlreadyRelaunched,
    /// The entry point ran to completion in the relaunch group.
    Completed,
}

/// Builds the registry and re-executes an entry point inside it.
#[derive(Debug, Clone)]
pub struct RelaunchBootstrap {
    marker: Arc<RelaunchMarker>,
    discovery: Discovery,
    location: Option<PathBuf>,
}

impl RelaunchBootstrap {
    /// Uses the process-wide marker.
    pub fn new(discovery: Discovery, location: Option<PathBuf>) -> Self {
        Self {
            marker: RelaunchMarker::global(),
            discovery,
            location,
        }
    }

    pub fn with_marker(mut self, marker: Arc<RelaunchMarker>) -> Self {
        self.marker = marker;
        self
    }

    pub fn marker(&self) -> &Arc<RelaunchMarker> {
        &self.marker
    }

    /// Runs the relaunch protocol without exiting the process.
    ///
    /// Blocks until every joined unit of the relaunch group has finished and
    /// returns the first failure recorded in the group.
    pub fn launch<F>(&self, args: Vec<String>, entry: F) -> Result<LaunchOutcome, RelaunchFailure>
    where
        F: FnOnce(LaunchContext) -> Result<(), BoxError> + Send + 'static,
    {
        if !self.marker.begin() {
            debug!("entry point already relaunched, continuing in place");
            return Ok(LaunchOutcome::AlreadyRelaunched);
        }

        let registry = Arc::new(self.discovery.build_registry(self.location.as_deref()));
        info!(
            modules = registry.len(),
            exported = registry.exported_types().len(),
            "plugin registry ready, relaunching entry point"
        );
        self.marker.finish();

        let group = ExecutionGroup::new(RELAUNCH_GROUP);
        let context = LaunchContext {
            args,
            registry: Arc::clone(&registry),
            group: group.clone(),
        };
        group.spawn_in(MAIN_UNIT, ActiveNamespace::Registry(registry), move || entry(context))?;
        group.join();

        match group.take_failure() {
            Some(failure) => Err(failure),
            None => Ok(LaunchOutcome::Completed),
        }
    }

    /// [`launch`](Self::launch), then exits the process with status 0 once
    /// the relaunched entry point completes. Returns `Ok` without running
    /// anything when the relaunch already happened.
    pub fn run<F>(&self, args: Vec<String>, entry: F) -> Result<(), RelaunchFailure>
    where
        F: FnOnce(LaunchContext) -> Result<(), BoxError> + Send + 'static,
    {
        match self.launch(args, entry)? {
            LaunchOutcome::AlreadyRelaunched => Ok(()),
            LaunchOutcome::Completed => {
                info!("relaunched entry point finished, exiting");
                std::process::exit(0)
            }
        }
    }
}
