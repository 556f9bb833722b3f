// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The active-module marker.
//!
//! Each thread carries the namespace that symbol lookups made on its behalf
//! should go through. The marker only changes through [`enter`], whose guard
//! puts the previous value back when dropped, including while unwinding.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use plugboard_core::{Namespace, ResolveError, TypeHandle};

use crate::loader::ModuleLoader;
use crate::registry::ModuleRegistry;

/// A namespace that can be made active on a thread.
#[derive(Clone)]
pub enum ActiveNamespace {
    /// The merged namespace of every module plus the host.
    Registry(Arc<ModuleRegistry>),
    /// One module's private namespace.
    Module(Arc<ModuleLoader>),
}

impl ActiveNamespace {
    pub fn namespace(&self) -> &dyn Namespace {
        match self {
            Self::Registry(registry) => registry.as_ref(),
            Self::Module(loader) => loader.as_ref(),
        }
    }

    /// Owning module, `None` for the registry.
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Self::Registry(_) => None,
            Self::Module(loader) => Some(loader.module_name()),
        }
    }

    /// Identity comparison.
    pub fn is_same(&self, other: &ActiveNamespace) -> bool {
        match (self, other) {
            (Self::Registry(a), Self::Registry(b)) => Arc::ptr_eq(a, b),
            (Self::Module(a), Self::Module(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ActiveNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(registry) => write!(f, "Registry({} modules)", registry.len()),
            Self::Module(loader) => write!(f, "Module({})", loader.module_name()),
        }
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<ActiveNamespace>> = const { RefCell::new(None) };
}

/// Restores the previously active namespace on drop.
#[must_use = "the marker is restored as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: Option<ActiveNamespace>,
    // Tied to the thread whose marker it restores.
    _thread: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The thread-local may already be gone during thread teardown.
        let _ = ACTIVE.try_with(|active| *active.borrow_mut() = previous);
    }
}

impl fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextGuard")
            .field("previous", &self.previous)
            .finish()
    }
}

/// Makes `namespace` active on this thread until the guard is dropped.
pub fn enter(namespace: ActiveNamespace) -> ContextGuard {
    let previous = ACTIVE.with(|active| active.replace(Some(namespace)));
    ContextGuard {
        previous,
        _thread: PhantomData,
    }
}

/// Shorthand for entering a module's namespace.
pub fn enter_module(loader: &Arc<ModuleLoader>) -> ContextGuard {
    enter(ActiveNamespace::Module(Arc::clone(loader)))
}

/// Runs `f` with `namespace` active.
pub fn scope<R>(namespace: ActiveNamespace, f: impl FnOnce() -> R) -> R {
    let _guard = enter(namespace);
    f()
}

/// The namespace active on this thread, if any.
pub fn current() -> Option<ActiveNamespace> {
    ACTIVE.with(|active| active.borrow().clone())
}

/// Name of the module whose namespace is active, if one is.
pub fn current_module() -> Option<String> {
    ACTIVE.with(|active| {
        active
            .borrow()
            .as_ref()
            .and_then(|ns| ns.module_name().map(str::to_string))
    })
}

/// Resolves `name` through the active namespace.
pub fn resolve(name: &str) -> Result<TypeHandle, ResolveError> {
    match current() {
        Some(active) => active.namespace().resolve(name),
        None => Err(ResolveError::NoActiveNamespace {
            name: name.to_string(),
        }),
    }
}
