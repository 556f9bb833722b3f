// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution policy between a module and the host.
//!
//! Two prefix sets decide the order in which a symbol is looked up: names
//! matching a module-forced prefix try the module's own locations first,
//! names matching a host-forced prefix try the host first. Everything else is
//! module first, host as a fallback. Module-forced prefixes win when both
//! sets match.

use plugboard_config::Properties;
use plugboard_core::DEFAULT_HOST_PREFIXES;
use tracing::warn;

/// Per-module manifest that tunes the policy.
pub const CLASSLOADER_CONFIG_FILE: &str = "classloader.properties";

/// Comma-separated prefixes resolved through the host before the module.
pub const LOAD_PARENT_KEY: &str = "classloader.load.parent";

/// Comma-separated prefixes resolved from the module before the host.
pub const LOAD_PLUGIN_KEY: &str = "classloader.load.plugin";

/// One place a loader can look a name up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The module's private code locations.
    Module,
    /// The host namespace.
    Host,
}

/// Immutable prefix sets of one module loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPolicy {
    host_prefixes: Vec<String>,
    module_prefixes: Vec<String>,
}

impl ResolutionPolicy {
    /// A policy with exactly the given prefixes (blank entries dropped).
    pub fn new<H, M>(host_prefixes: H, module_prefixes: M) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            host_prefixes: normalize(host_prefixes),
            module_prefixes: normalize(module_prefixes),
        }
    }

    /// Built-in host prefixes plus `extra_host`.
    pub fn with_defaults(extra_host: &[String]) -> Self {
        Self::new(
            DEFAULT_HOST_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .chain(extra_host.iter().cloned()),
            Vec::<String>::new(),
        )
    }

    /// Adds the prefixes listed in a module's `classloader.properties`.
    pub fn extend_from_properties(self, properties: &Properties) -> Self {
        let mut host = self.host_prefixes;
        host.extend(properties.get_list(LOAD_PARENT_KEY));
        let mut module = self.module_prefixes;
        module.extend(properties.get_list(LOAD_PLUGIN_KEY));
        Self::new(host, module)
    }

    pub fn host_prefixes(&self) -> &[String] {
        &self.host_prefixes
    }

    pub fn module_prefixes(&self) -> &[String] {
        &self.module_prefixes
    }

    pub fn forces_module(&self, name: &str) -> bool {
        self.module_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn forces_host(&self, name: &str) -> bool {
        self.host_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Order in which `name` is looked up after the loader's own cache.
    pub fn lookup_order(&self, name: &str) -> [Source; 2] {
        if !self.forces_module(name) && self.forces_host(name) {
            [Source::Host, Source::Module]
        } else {
            [Source::Module, Source::Host]
        }
    }

    /// Pairs of (host, module) prefixes where one is a prefix of the other.
    pub fn overlaps(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for host in &self.host_prefixes {
            for module in &self.module_prefixes {
                if host.starts_with(module.as_str()) || module.starts_with(host.as_str()) {
                    pairs.push((host.clone(), module.clone()));
                }
            }
        }
        pairs
    }

    /// Logs a warning for every overlapping pair.
    pub fn warn_overlaps(&self, module: &str) {
        for (host, plugin) in self.overlaps() {
            warn!(
                module = %module,
                host_prefix = %host,
                module_prefix = %plugin,
                "overlapping resolution prefixes, module-forced prefix takes precedence"
            );
        }
    }
}

fn normalize<I>(prefixes: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for prefix in prefixes {
        let prefix: String = prefix.into();
        let prefix = prefix.trim();
        if !prefix.is_empty() && !out.iter().any(|p| p == prefix) {
            out.push(prefix.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MODULE_FIRST: [Source; 2] = [Source::Module, Source::Host];
    const HOST_FIRST: [Source; 2] = [Source::Host, Source::Module];

    #[test]
    fn defaults_route_runtime_api_to_host() {
        let policy = ResolutionPolicy::with_defaults(&[]);
        assert_eq!(policy.lookup_order("plugboard.spi.Extension"), HOST_FIRST);
        assert_eq!(policy.lookup_order("tracing.Span"), HOST_FIRST);
        assert_eq!(policy.lookup_order("com.acme.Greeter"), MODULE_FIRST);
    }

    #[test]
    fn properties_extend_both_sets() {
        let props = Properties::parse(
            "classloader.load.parent = shared.util., ,other.\nclassloader.load.plugin=plugboard.spi.\n",
        );
        let policy = ResolutionPolicy::with_defaults(&[]).extend_from_properties(&props);
        assert!(policy.host_prefixes().contains(&"shared.util.".to_string()));
        assert!(policy.host_prefixes().contains(&"other.".to_string()));
        assert_eq!(policy.module_prefixes(), &["plugboard.spi."]);
        assert_eq!(policy.lookup_order("shared.util.Helper"), HOST_FIRST);
        assert_eq!(policy.lookup_order("plugboard.spi.Extension"), MODULE_FIRST);
        assert_eq!(policy.lookup_order("plugboard.Other"), HOST_FIRST);
    }

    #[test]
    fn overlaps_are_reported_both_ways() {
        let policy = ResolutionPolicy::new(["a.b."], ["a.", "c."]);
        assert_eq!(policy.overlaps(), vec![("a.b.".to_string(), "a.".to_string())]);
        let policy = ResolutionPolicy::new(["x."], ["x.y."]);
        assert_eq!(policy.overlaps().len(), 1);
        assert!(ResolutionPolicy::new(["x."], ["y."]).overlaps().is_empty());
    }

    #[test]
    fn blank_and_duplicate_prefixes_are_dropped() {
        let policy = ResolutionPolicy::new(["a.", " ", "a.", " b. "], Vec::<String>::new());
        assert_eq!(policy.host_prefixes(), &["a.", "b."]);
    }

    proptest! {
        #[test]
        fn module_prefix_always_wins(prefix in "[a-z]{1,6}\\.", rest in "[A-Za-z]{1,8}") {
            let policy = ResolutionPolicy::new([prefix.clone()], [prefix.clone()]);
            let name = format!("{prefix}{rest}");
            prop_assert_eq!(policy.lookup_order(&name), MODULE_FIRST);
        }

        #[test]
        fn unmatched_names_fall_through(name in "[A-Z][a-z]{0,8}") {
            let policy = ResolutionPolicy::with_defaults(&[]);
            prop_assert_eq!(policy.lookup_order(&name), MODULE_FIRST);
        }

        #[test]
        fn host_prefix_routes_to_host(prefix in "[a-z]{1,6}\\.", rest in "[A-Za-z]{1,8}") {
            let policy = ResolutionPolicy::new([prefix.clone()], Vec::<String>::new());
            prop_assert_eq!(policy.lookup_order(&format!("{prefix}{rest}")), HOST_FIRST);
        }
    }
}
