// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The namespace abstraction shared by the host, module loaders and the
//! merged module registry.

use crate::error::ResolveError;
use crate::symbol::{Resource, TypeHandle};

/// A queryable resolution context for types and resources.
pub trait Namespace: Send + Sync {
    /// Resolves a qualified type name, failing with
    /// [`ResolveError::NotFound`] when no location yields it.
    fn resolve(&self, name: &str) -> Result<TypeHandle, ResolveError>;

    /// Returns the first resource with the given name.
    fn find_resource(&self, name: &str) -> Option<Resource>;

    /// Returns every resource with the given name, in lookup order.
    fn find_resources(&self, name: &str) -> Vec<Resource>;
}
