// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup banner: loaded modules and registered extensions.

use std::fmt::Write;

use plugboard_loader::ModuleRegistry;
use tracing::info;

use crate::lifecycle::StartupReport;

/// One loaded module, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    pub name: String,
    /// Body locations followed by private dependencies.
    pub archives: Vec<String>,
    pub dependencies: usize,
    /// Declared extension names, exported or not.
    pub declared: usize,
    pub exported: Vec<String>,
}

pub fn module_summaries(registry: &ModuleRegistry) -> Vec<ModuleSummary> {
    registry
        .modules()
        .iter()
        .map(|module| ModuleSummary {
            name: module.name().to_string(),
            archives: module
                .loader()
                .locations()
                .iter()
                .map(|archive| archive.location().to_string())
                .collect(),
            dependencies: module.loader().dependency_count(),
            declared: module.manifest().len(),
            exported: module.exports().keys().cloned().collect(),
        })
        .collect()
}

/// Plain-text listing of the modules in `registry`.
pub fn render_modules(registry: &ModuleRegistry) -> String {
    let mut out = String::new();
    let summaries = module_summaries(registry);
    let _ = writeln!(out, "Loaded modules ({})", summaries.len());
    for summary in &summaries {
        let _ = writeln!(out);
        let _ = writeln!(out, ":: {}", summary.name);
        let _ = writeln!(out, "   archives:");
        for archive in &summary.archives {
            let _ = writeln!(out, "     {archive}");
        }
        let _ = writeln!(
            out,
            "   exported types ({} of {} declared):",
            summary.exported.len(),
            summary.declared
        );
        for name in &summary.exported {
            let _ = writeln!(out, "     {name}");
        }
    }
    out
}

/// Plain-text listing of the extensions in `report`.
pub fn render_extensions(report: &StartupReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Registered extensions ({})", report.active.len());
    for ext in &report.active {
        let _ = writeln!(
            out,
            ":: {}:{}  {} [{}] ({})",
            ext.key, ext.name, ext.type_name, ext.module, ext.state
        );
    }
    if !report.failed.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failed extensions ({})", report.failed.len());
        for failed in &report.failed {
            let phase = failed
                .phase
                .map(|p| p.to_string())
                .unwrap_or_else(|| "instantiate".to_string());
            let _ = writeln!(
                out,
                ":: {} [{}] {phase}: {}",
                failed.type_name, failed.module, failed.reason
            );
        }
    }
    out
}

/// Logs one line per module.
pub fn log_modules(registry: &ModuleRegistry) {
    for summary in module_summaries(registry) {
        info!(
            module = %summary.name,
            archives = %summary.archives.join(", "),
            exported = %summary.exported.join(", "),
            "plugin module"
        );
    }
}

/// Logs one line per registered extension.
pub fn log_extensions(report: &StartupReport) {
    for ext in &report.active {
        info!(
            key = %ext.key,
            name = %ext.name,
            type_name = %ext.type_name,
            module = %ext.module,
            "registered extension"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plugboard_core::{HostNamespace, LifecyclePhase, LifecycleState};
    use plugboard_loader::Discovery;
    use plugboard_test_utils::{Bundle, ModuleSpec, PluginRoot};

    use super::*;
    use crate::lifecycle::{ExtensionSummary, FailedExtension};

    #[test]
    fn modules_list_archives_and_exports() {
        let root = PluginRoot::with_modules([ModuleSpec::new("alpha")
            .extension("com.alpha.Greeter", "greeter")
            .declare("com.alpha.Missing")
            .lib(Bundle::new("dep.tar"))])
        .unwrap();
        let registry = Discovery::new(Arc::new(HostNamespace::new())).build_registry(Some(root.path()));

        let summaries = module_summaries(&registry);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].archives.len(), 2);
        assert_eq!(summaries[0].dependencies, 1);
        assert_eq!(summaries[0].declared, 2);

        let text = render_modules(&registry);
        assert!(text.starts_with("Loaded modules (1)"));
        assert!(text.contains(":: alpha"));
        assert!(text.contains("exported types (1 of 2 declared):"));
        assert!(text.contains("     com.alpha.Greeter"));
    }

    #[test]
    fn extensions_list_active_and_failed() {
        let report = StartupReport {
            active: vec![ExtensionSummary {
                key: "greeter".into(),
                name: "Greeter".into(),
                type_name: "com.alpha.Greeter".into(),
                module: "alpha".into(),
                state: LifecycleState::Started,
            }],
            failed: vec![FailedExtension {
                module: "beta".into(),
                type_name: "com.beta.Echo".into(),
                phase: Some(LifecyclePhase::Start),
                reason: "[E1] port busy".into(),
            }],
        };
        let text = render_extensions(&report);
        assert!(text.contains(":: greeter:Greeter  com.alpha.Greeter [alpha] (started)"));
        assert!(text.contains(":: com.beta.Echo [beta] start: [E1] port busy"));
    }
}
