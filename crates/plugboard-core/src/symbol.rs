// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Symbol model: type descriptors, resolved type handles and resources.
//!
//! A code location stores one TOML descriptor per type at `a/b/C.type` for
//! the qualified name `a.b.C`. Defining a type turns the descriptor into a
//! [`TypeHandle`], whose identity is the identity of the defining loader's
//! arena entry: two loaders defining the same name produce two distinct,
//! mutually non-assignable handles.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// File suffix of a type descriptor inside a code location.
pub const TYPE_FILE_SUFFIX: &str = ".type";

/// Archive entry name holding the descriptor for `symbol`.
pub fn symbol_entry_name(symbol: &str) -> String {
    format!("{}{TYPE_FILE_SUFFIX}", symbol.replace('.', "/"))
}

/// Qualified symbol name defined by an archive entry, if the entry is a
/// type descriptor.
pub fn entry_symbol_name(entry: &str) -> Option<String> {
    entry
        .strip_suffix(TYPE_FILE_SUFFIX)
        .filter(|stem| !stem.is_empty() && !stem.ends_with('/'))
        .map(|stem| stem.replace('/', "."))
}

/// On-disk form of a type definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDescriptor {
    /// Contracts this type implements, resolved through the defining loader.
    #[serde(default)]
    pub implements: Vec<String>,

    /// Host binding that constructs instances of this type.
    #[serde(default)]
    pub binding: Option<String>,

    /// Free-form attributes handed to the binding.
    #[serde(default)]
    pub attributes: toml::Table,
}

impl TypeDescriptor {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn implementing(contract: impl Into<String>) -> Self {
        Self {
            implements: vec![contract.into()],
            ..Self::default()
        }
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Serializes the descriptor back to TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

/// Where a type was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrigin {
    /// Defined by the host application.
    Host,
    /// Defined by a module loader from one of its code locations.
    Module { module: String, location: String },
}

/// A defined type. Only reachable through [`TypeHandle`].
#[derive(Debug)]
pub struct TypeDef {
    name: String,
    origin: TypeOrigin,
    interfaces: Vec<TypeHandle>,
    binding: Option<String>,
    attributes: toml::Table,
}

/// Shared handle to a defined type. Equality is identity.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDef>);

impl TypeHandle {
    /// Defines a new type. Interfaces must already be resolved by the caller.
    pub fn define(
        name: impl Into<String>,
        origin: TypeOrigin,
        interfaces: Vec<TypeHandle>,
        descriptor: TypeDescriptor,
    ) -> Self {
        Self(Arc::new(TypeDef {
            name: name.into(),
            origin,
            interfaces,
            binding: descriptor.binding,
            attributes: descriptor.attributes,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn origin(&self) -> &TypeOrigin {
        &self.0.origin
    }

    /// Module that defined this type, or `None` for host types.
    pub fn module(&self) -> Option<&str> {
        match &self.0.origin {
            TypeOrigin::Host => None,
            TypeOrigin::Module { module, .. } => Some(module),
        }
    }

    pub fn is_host_type(&self) -> bool {
        matches!(self.0.origin, TypeOrigin::Host)
    }

    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.0.interfaces
    }

    pub fn binding(&self) -> Option<&str> {
        self.0.binding.as_deref()
    }

    pub fn attributes(&self) -> &toml::Table {
        &self.0.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&toml::Value> {
        self.0.attributes.get(key)
    }

    /// Identity comparison.
    pub fn same_type(&self, other: &TypeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True if this type is `contract` or implements it, directly or through
    /// one of its interfaces. A same-named type from another loader does not
    /// count.
    pub fn is_assignable_to(&self, contract: &TypeHandle) -> bool {
        self.same_type(contract)
            || self
                .0
                .interfaces
                .iter()
                .any(|iface| iface.is_assignable_to(contract))
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl Eq for TypeHandle {}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("name", &self.0.name)
            .field("origin", &self.0.origin)
            .field("binding", &self.0.binding)
            .finish()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// A resource found in a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    location: String,
    data: Vec<u8>,
}

impl Resource {
    pub fn new(name: impl Into<String>, location: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            data,
        }
    }

    /// Name the resource was looked up by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the resource lives (`<archive>!/<entry>` or `host:<name>`).
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.data)
    }
}
