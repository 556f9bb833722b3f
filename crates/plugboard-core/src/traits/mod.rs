// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams of the runtime.

pub mod extension;
pub mod namespace;

pub use extension::{Extension, ExtensionContext, ExtensionFactory};
pub use namespace::Namespace;
