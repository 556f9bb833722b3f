// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugboard - plugin module runtime.
//!
//! This is the binary entry point: inspect a plugin root, run its
//! extensions, or print the resolved configuration.

mod inspect;
mod run;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figment::providers::Serialized;
use plugboard_config::{HostConfig, PlugboardConfig};
use plugboard_core::PlugboardError;

/// Plugboard - discover plugin modules and run their extensions.
#[derive(Parser, Debug)]
#[command(name = "plugboard", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover plugin modules and print what they export.
    Inspect {
        /// Plugin root, overriding `plugin.location`.
        #[arg(long)]
        plugin_location: Option<PathBuf>,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Start every extension and run until interrupted.
    Run {
        /// Plugin root, overriding `plugin.location`.
        #[arg(long)]
        plugin_location: Option<PathBuf>,
    },
    /// Print the resolved configuration as TOML.
    Config,
}

impl Commands {
    fn plugin_location(&self) -> Option<PathBuf> {
        match self {
            Self::Inspect {
                plugin_location, ..
            }
            | Self::Run { plugin_location } => plugin_location.clone(),
            Self::Config => None,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let host = host_config(cli.command.as_ref().and_then(Commands::plugin_location));
    let config = match plugboard_config::validate_host(&host) {
        Ok(config) => config,
        Err(errors) => {
            plugboard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging.level);

    let result = match cli.command {
        Some(Commands::Inspect { plain, .. }) => inspect::run_inspect(&config, plain),
        Some(Commands::Run { .. }) => run::run_plugins(host, &config),
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("plugboard: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Host configuration with `--plugin-location` applied above every other
/// source.
fn host_config(plugin_location: Option<PathBuf>) -> HostConfig {
    let host = HostConfig::load();
    match plugin_location {
        Some(location) => host.with_override(Serialized::default("plugin.location", location)),
        None => host,
    }
}

fn print_config(config: &PlugboardConfig) -> Result<(), PlugboardError> {
    let rendered =
        toml::to_string_pretty(config).map_err(|e| PlugboardError::Internal(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plugboard={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .init();
}
