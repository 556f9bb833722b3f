// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plugboard plugin runtime.
//!
//! This crate provides the symbol model (type descriptors and identity-based
//! type handles), the host namespace, the extension contract, and the error
//! types used throughout the workspace.

pub mod error;
pub mod host;
pub mod symbol;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{
    ArchiveError, BoxError, DiscoveryError, ExtensionError, InitError, PlugboardError,
    RelaunchFailure, ResolveError,
};
pub use host::HostNamespace;
pub use symbol::{Resource, TypeDescriptor, TypeHandle, TypeOrigin};
pub use traits::{Extension, ExtensionContext, ExtensionFactory, Namespace};
pub use types::{DEFAULT_HOST_PREFIXES, EXTENSION_CONTRACT, LifecyclePhase, LifecycleState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugboard_error_wraps_subsystem_errors() {
        let err: PlugboardError = ResolveError::not_found("x.Y").into();
        assert_eq!(err.to_string(), "symbol not found: x.Y");

        let err: PlugboardError = DiscoveryError::MissingBody {
            module: "beta".into(),
        }
        .into();
        assert!(matches!(err, PlugboardError::Discovery(_)));

        let err = PlugboardError::Config("plugin.location is empty".into());
        assert_eq!(err.to_string(), "configuration error: plugin.location is empty");
    }

    #[test]
    fn host_namespace_is_usable_as_trait_object() {
        let host: Box<dyn Namespace> = Box::new(HostNamespace::new());
        assert!(host.resolve(EXTENSION_CONTRACT).is_ok());
        assert!(host.resolve("nope.Nope").unwrap_err().is_not_found());
    }
}
