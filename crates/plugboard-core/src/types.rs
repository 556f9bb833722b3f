// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types and well-known names shared across the runtime crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Qualified name of the base extension contract every exported type must
/// implement to be registered.
pub const EXTENSION_CONTRACT: &str = "plugboard.spi.Extension";

/// Prefixes that always resolve through the host namespace unless a module
/// explicitly pins them. These are the types host and modules must agree on:
/// the runtime's own API, serialization, and the logging facade/backend.
pub const DEFAULT_HOST_PREFIXES: &[&str] = &["plugboard.", "serde.", "tracing.", "log."];

/// Lifecycle state of one extension instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Instantiated from an exported type, not yet initialized.
    Discovered,
    /// `init` succeeded.
    Configured,
    /// `start` succeeded.
    Started,
    /// `stop` was invoked (successfully or not).
    Stopped,
    /// Excluded after a failed instantiate/init/start.
    Failed,
}

impl LifecycleState {
    /// True while the instance still participates in the lifecycle.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Discovered | Self::Configured | Self::Started)
    }
}

/// A lifecycle call into an extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    Init,
    Start,
    Stop,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn lifecycle_state_display_round_trip() {
        for state in [
            LifecycleState::Discovered,
            LifecycleState::Configured,
            LifecycleState::Started,
            LifecycleState::Stopped,
            LifecycleState::Failed,
        ] {
            let s = state.to_string();
            assert_eq!(LifecycleState::from_str(&s).unwrap(), state);
        }
        assert_eq!(LifecycleState::Started.to_string(), "started");
    }

    #[test]
    fn only_live_states_are_active() {
        assert!(LifecycleState::Configured.is_active());
        assert!(!LifecycleState::Stopped.is_active());
        assert!(!LifecycleState::Failed.is_active());
    }

    #[test]
    fn contract_is_covered_by_default_host_prefixes() {
        assert!(
            DEFAULT_HOST_PREFIXES
                .iter()
                .any(|p| EXTENSION_CONTRACT.starts_with(p))
        );
    }
}
