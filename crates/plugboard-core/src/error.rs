// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plugboard plugin runtime.
//!
//! Errors that can be pinned to a single module (discovery, manifest parsing,
//! export resolution, init/start) are caught by the runtime and turned into
//! "this module is absent". Only [`RelaunchFailure`] is fatal.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::LifecyclePhase;

/// Boxed error used as the source of extension and relaunch failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A symbol could not be resolved along the ordered resolution policy.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No location (module-private or host) yields the symbol.
    #[error("symbol not found: {name}")]
    NotFound { name: String },

    /// A type's `implements` list leads back to itself.
    #[error("circular type definition: {}", chain.join(" -> "))]
    Circular { chain: Vec<String> },

    /// The type descriptor exists but cannot be parsed.
    #[error("malformed type descriptor for {name} in {location}: {reason}")]
    Malformed {
        name: String,
        location: String,
        reason: String,
    },

    /// The type descriptor exists but cannot be read.
    #[error("failed to read {name} from {location}: {source}")]
    Io {
        name: String,
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Resolution through the active-module marker with no marker set.
    #[error("no active namespace to resolve {name}")]
    NoActiveNamespace { name: String },
}

impl ResolveError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// True for plain misses, which the resolution policy falls through on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure to open or read a module archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive location does not exist: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entry {entry} not found in {archive}")]
    EntryNotFound { archive: String, entry: String },
}

/// One module could not be built during discovery. The module is skipped and
/// discovery of its siblings continues.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(
        "module {module} has no body (expected a packaged bundle or classes/ directly under the module directory)"
    )]
    MissingBody { module: String },

    #[error("module {module}: {source}")]
    Archive {
        module: String,
        #[source]
        source: ArchiveError,
    },

    #[error("module {module}: malformed service manifest {file}: {reason}")]
    Manifest {
        module: String,
        file: String,
        reason: String,
    },

    #[error("module {module}: malformed classloader.properties: {reason}")]
    ClassloaderConfig { module: String, reason: String },
}

impl DiscoveryError {
    /// Name of the module this error is attributed to.
    pub fn module(&self) -> &str {
        match self {
            Self::MissingBody { module }
            | Self::Archive { module, .. }
            | Self::Manifest { module, .. }
            | Self::ClassloaderConfig { module, .. } => module,
        }
    }
}

/// Structured error returned by an extension's own methods.
#[derive(Debug, Error)]
#[error("[{code}] {message}")]
pub struct ExtensionError {
    /// Stable error code chosen by the extension author.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl ExtensionError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Converts a caught panic payload into an extension error.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::new("PANIC", panic_message(payload))
    }
}

/// Extracts the message from a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// An extension failed to come up. The extension is excluded from further
/// lifecycle steps; host startup continues.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to instantiate {type_name} from module {module}: {reason}")]
    Instantiate {
        module: String,
        type_name: String,
        reason: String,
    },

    #[error("{phase} failed for {type_name} from module {module}: {source}")]
    Phase {
        module: String,
        type_name: String,
        phase: LifecyclePhase,
        #[source]
        source: ExtensionError,
    },
}

impl InitError {
    pub fn module(&self) -> &str {
        match self {
            Self::Instantiate { module, .. } | Self::Phase { module, .. } => module,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Instantiate { type_name, .. } | Self::Phase { type_name, .. } => type_name,
        }
    }
}

/// The relaunched entry point failed. Fatal for the bootstrapping process.
#[derive(Debug, Error)]
pub enum RelaunchFailure {
    #[error("an uncaught failure occurred in {unit}: {message}")]
    Uncaught {
        unit: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("failed to spawn execution unit {unit}: {source}")]
    Spawn {
        unit: String,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for callers that do not care which subsystem failed.
#[derive(Debug, Error)]
pub enum PlugboardError {
    /// Configuration errors (invalid TOML, bad plugin location).
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Relaunch(#[from] RelaunchFailure),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
