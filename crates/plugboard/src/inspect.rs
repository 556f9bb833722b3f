// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugboard inspect`: discover modules and print what they export.

use std::fmt::Write;
use std::io::IsTerminal;
use std::sync::Arc;

use plugboard_config::PlugboardConfig;
use plugboard_core::{DiscoveryError, HostNamespace, PlugboardError};
use plugboard_loader::{Discovery, ModuleRegistry};
use plugboard_runtime::banner::module_summaries;

/// Discovery configured from the host configuration.
pub fn discovery(config: &PlugboardConfig) -> Discovery {
    Discovery::new(Arc::new(HostNamespace::new()))
        .with_host_prefixes(config.plugin.host_prefixes.clone())
}

/// Runs the inspect command.
///
/// With `--plain` or when stdout is not a TTY, disables colors.
pub fn run_inspect(config: &PlugboardConfig, plain: bool) -> Result<(), PlugboardError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let discovery = discovery(config);
    let report = discovery.discover_with_report(config.plugin.location.as_deref());
    let registry = ModuleRegistry::new(Arc::clone(discovery.host()), report.modules);

    print!("{}", render(&registry, &report.errors, use_color));
    Ok(())
}

fn render(registry: &ModuleRegistry, errors: &[DiscoveryError], use_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "  plugboard inspect");
    let _ = writeln!(out, "  {}", "-".repeat(50));

    for summary in module_summaries(registry) {
        let name = if use_color {
            use colored::Colorize;
            format!("{} {}", "✓".green(), summary.name.bold())
        } else {
            format!("[OK]   {}", summary.name)
        };
        let _ = writeln!(out, "    {name}");
        for archive in &summary.archives {
            let _ = writeln!(out, "           archive  {archive}");
        }
        if summary.exported.is_empty() {
            let note = format!("no exported extensions ({} declared)", summary.declared);
            if use_color {
                use colored::Colorize;
                let _ = writeln!(out, "           {}", note.yellow());
            } else {
                let _ = writeln!(out, "           {note}");
            }
        }
        for exported in &summary.exported {
            let _ = writeln!(out, "           exports  {exported}");
        }
    }

    for error in errors {
        let line = if use_color {
            use colored::Colorize;
            format!("{} {}", "✗".red(), error.to_string().red())
        } else {
            format!("[SKIP] {error}")
        };
        let _ = writeln!(out, "    {line}");
    }

    let _ = writeln!(out);
    let module_word = if registry.len() == 1 { "module" } else { "modules" };
    let _ = writeln!(
        out,
        "  {} {module_word} loaded, {} skipped, {} extension types exported.",
        registry.len(),
        errors.len(),
        registry.exported_types().len()
    );
    out
}
