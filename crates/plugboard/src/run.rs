// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugboard run`: two-phase startup, then every extension runs until the
//! process is signalled.

use plugboard_config::{HostConfig, PlugboardConfig};
use plugboard_core::{BoxError, PlugboardError};
use plugboard_runtime::{
    BindingTable, LaunchContext, LifecycleCoordinator, RelaunchBootstrap, StartupReport, banner,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::inspect::discovery;
use crate::shutdown;

/// Relaunches into the plugin registry and serves until SIGINT/SIGTERM.
///
/// Exits the process with status 0 when the extensions have been stopped.
pub fn run_plugins(host: HostConfig, config: &PlugboardConfig) -> Result<(), PlugboardError> {
    let bootstrap = RelaunchBootstrap::new(discovery(config), config.plugin.location.clone());
    let args = std::env::args().collect();
    bootstrap
        .run(args, move |ctx| serve(ctx, host))
        .map_err(PlugboardError::from)
}

/// Entry point of the relaunched process.
fn serve(ctx: LaunchContext, host: HostConfig) -> Result<(), BoxError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let cancel = shutdown::install_signal_handler();
        serve_until(&ctx, host, cancel).await;
    });
    Ok(())
}

/// Starts every extension, waits for `cancel`, then stops them.
async fn serve_until(
    ctx: &LaunchContext,
    host: HostConfig,
    cancel: CancellationToken,
) -> StartupReport {
    banner::log_modules(&ctx.registry);

    let mut lifecycle = LifecycleCoordinator::new(host, BindingTable::with_builtins());
    let report = lifecycle.startup(&ctx.registry);
    banner::log_extensions(&report);
    info!(
        modules = ctx.registry.len(),
        extensions = report.active.len(),
        "plugboard running, press Ctrl+C to stop"
    );

    cancel.cancelled().await;
    lifecycle.shutdown();
    info!("plugboard stopped");
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plugboard_core::{EXTENSION_CONTRACT, HostNamespace, LifecycleState, TypeDescriptor};
    use plugboard_loader::Discovery;
    use plugboard_runtime::{ExecutionGroup, LOGGING_BINDING};
    use plugboard_test_utils::{ModuleSpec, PluginRoot};

    use super::*;

    #[tokio::test]
    async fn serves_builtin_extensions_until_cancelled() {
        let root = PluginRoot::with_modules([
            ModuleSpec::new("alpha").extension_with(
                "com.alpha.Hello",
                TypeDescriptor::implementing(EXTENSION_CONTRACT)
                    .with_binding(LOGGING_BINDING)
                    .with_attribute("message", "hello from alpha"),
            ),
            ModuleSpec::new("beta").extension("com.beta.Unbound", "not.registered"),
        ])
        .unwrap();
        let registry = Discovery::new(Arc::new(HostNamespace::new())).build_registry(Some(root.path()));
        let ctx = LaunchContext {
            args: Vec::new(),
            registry: Arc::new(registry),
            group: ExecutionGroup::new("test"),
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = serve_until(&ctx, HostConfig::default(), cancel).await;

        assert_eq!(report.active.len(), 1);
        assert_eq!(report.active[0].key, "hello");
        assert_eq!(report.active[0].state, LifecycleState::Started);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].module, "beta");
    }
}
