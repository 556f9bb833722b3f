// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module loading for Plugboard.
//!
//! Discovers modules on disk, gives each one an isolated symbol loader with a
//! prefix-based policy towards the host, exports the extension types each
//! module declares, and merges the modules into one registry. Also home of
//! the per-thread active-module marker.

pub mod archive;
pub mod context;
pub mod discovery;
pub mod exporter;
pub mod loader;
pub mod module;
pub mod policy;
pub mod registry;

pub use archive::ModuleArchive;
pub use context::{ActiveNamespace, ContextGuard};
pub use discovery::{Discovery, DiscoveryReport, discover};
pub use exporter::{ExtensionDescriptor, ServiceExporter, ServiceManifest};
pub use loader::ModuleLoader;
pub use module::Module;
pub use policy::{ResolutionPolicy, Source};
pub use registry::{ExportedType, ModuleRegistry};
