// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Isolated execution groups.
//!
//! An [`ExecutionGroup`] owns the threads ("units") spawned for a relaunched
//! entry point. Units inherit the spawner's active namespace, failures and
//! panics in any unit land in a first-failure slot, and [`join`] waits for
//! every non-background unit, including units spawned while joining.
//!
//! [`join`]: ExecutionGroup::join

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use plugboard_core::error::panic_message;
use plugboard_core::{BoxError, RelaunchFailure};
use plugboard_loader::context::{self, ActiveNamespace};
use tracing::{debug, error, warn};

thread_local! {
    static CURRENT_GROUP: RefCell<Option<ExecutionGroup>> = const { RefCell::new(None) };
}

struct Unit {
    name: String,
    handle: JoinHandle<()>,
}

struct GroupInner {
    name: String,
    pending: Mutex<Vec<Unit>>,
    failure: Mutex<Option<RelaunchFailure>>,
    spawned: AtomicUsize,
}

/// A set of threads whose failures are collected in one place.
#[derive(Clone)]
pub struct ExecutionGroup {
    inner: Arc<GroupInner>,
}

impl ExecutionGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(GroupInner {
                name: name.into(),
                pending: Mutex::new(Vec::new()),
                failure: Mutex::new(None),
                spawned: AtomicUsize::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The group the calling thread runs in, if any.
    pub fn current() -> Option<Self> {
        CURRENT_GROUP.with(|group| group.borrow().clone())
    }

    /// Units spawned so far, background ones included.
    pub fn spawned_count(&self) -> usize {
        self.inner.spawned.load(Ordering::Relaxed)
    }

    /// Spawns a unit that [`join`](Self::join) waits for. The unit runs with
    /// the caller's active namespace.
    pub fn spawn<F>(&self, unit: impl Into<String>, f: F) -> Result<(), RelaunchFailure>
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.spawn_unit(unit.into(), context::current(), false, f)
    }

    /// Spawns a unit that is not joined. Its failures are still recorded.
    pub fn spawn_background<F>(&self, unit: impl Into<String>, f: F) -> Result<(), RelaunchFailure>
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.spawn_unit(unit.into(), context::current(), true, f)
    }

    /// Spawns a joined unit with `namespace` active.
    pub fn spawn_in<F>(
        &self,
        unit: impl Into<String>,
        namespace: ActiveNamespace,
        f: F,
    ) -> Result<(), RelaunchFailure>
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.spawn_unit(unit.into(), Some(namespace), false, f)
    }

    fn spawn_unit<F>(
        &self,
        unit: String,
        namespace: Option<ActiveNamespace>,
        background: bool,
        f: F,
    ) -> Result<(), RelaunchFailure>
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        let group = self.clone();
        let thread_unit = unit.clone();
        let handle = thread::Builder::new()
            .name(unit.clone())
            .spawn(move || group.run_unit(&thread_unit, namespace, f))
            .map_err(|source| RelaunchFailure::Spawn {
                unit: unit.clone(),
                source,
            })?;

        self.inner.spawned.fetch_add(1, Ordering::Relaxed);
        debug!(group = %self.name(), unit = %unit, background, "spawned execution unit");
        if !background {
            self.lock_pending().push(Unit { name: unit, handle });
        }
        Ok(())
    }

    fn run_unit<F>(&self, unit: &str, namespace: Option<ActiveNamespace>, f: F)
    where
        F: FnOnce() -> Result<(), BoxError>,
    {
        CURRENT_GROUP.with(|group| *group.borrow_mut() = Some(self.clone()));
        let _context = namespace.map(context::enter);

        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(())) => debug!(unit = %unit, "execution unit finished"),
            Ok(Err(e)) => self.record_failure(RelaunchFailure::Uncaught {
                unit: unit.to_string(),
                message: e.to_string(),
                source: Some(e),
            }),
            Err(payload) => self.record_failure(RelaunchFailure::Uncaught {
                unit: unit.to_string(),
                message: panic_message(payload.as_ref()),
                source: None,
            }),
        }

        CURRENT_GROUP.with(|group| group.borrow_mut().take());
    }

    /// Blocks until every joined unit has finished, repeating until no new
    /// units were spawned in the meantime.
    pub fn join(&self) {
        loop {
            let batch = std::mem::take(&mut *self.lock_pending());
            if batch.is_empty() {
                break;
            }
            for unit in batch {
                // Units catch their own panics; this only fires if that failed.
                if let Err(payload) = unit.handle.join() {
                    self.record_failure(RelaunchFailure::Uncaught {
                        unit: unit.name,
                        message: panic_message(payload.as_ref()),
                        source: None,
                    });
                }
            }
        }
        debug!(group = %self.name(), "execution group joined");
    }

    /// Stores `failure` unless one is already recorded.
    pub fn record_failure(&self, failure: RelaunchFailure) {
        let mut slot = self.inner.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            error!(group = %self.name(), error = %failure, "uncaught failure in execution group");
            *slot = Some(failure);
        } else {
            warn!(group = %self.name(), error = %failure, "further failure in execution group, keeping the first");
        }
    }

    /// Removes and returns the first recorded failure.
    pub fn take_failure(&self) -> Option<RelaunchFailure> {
        self.inner
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn has_failure(&self) -> bool {
        self.inner
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<Unit>> {
        self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ExecutionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionGroup")
            .field("name", &self.inner.name)
            .field("spawned", &self.spawned_count())
            .field("has_failure", &self.has_failure())
            .finish()
    }
}
