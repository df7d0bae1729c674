//! Command-line interface for the gate binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::GateConfig;
use crate::handlers;
use crate::router::Router;
use crate::rules::RuleSet;
use crate::server::{AppService, HttpServer};

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "HTTP request-authorization gate", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gate server
    Serve {
        /// Listen address (overrides config and GATE_ADDR)
        #[arg(short, long)]
        addr: Option<String>,

        /// Path to a YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the effective access rules and route table
    Routes {
        /// Path to a YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { addr, config } => serve(addr, config),
        Commands::Routes { config } => routes(config),
    }
}

fn serve(addr: Option<String>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = GateConfig::load(config_path.as_deref())?;
    if let Some(addr) = addr {
        config.addr = addr;
    }

    may::config().set_stack_size(config.stack_size);
    if config.uses_dev_signature() {
        warn!("Session signature is the development placeholder; set GATE_SESSION_SIGNATURE");
    }

    let service = AppService::from_config(&config)?;
    info!(addr = %config.addr, "Starting authorization gate");
    let handle = HttpServer(service)
        .start(&config.addr)
        .with_context(|| format!("failed to bind {}", config.addr))?;
    handle.wait_ready().context("server did not become ready")?;
    info!(addr = %config.addr, "Gate ready");

    wait_for_shutdown()?;
    handle.stop();
    info!("Gate stopped");
    Ok(())
}

fn routes(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = GateConfig::load(config_path.as_deref())?;
    let rules = RuleSet::public_paths(&config.public_paths);
    println!("[rules] count={} (first match wins)", rules.rules().len());
    for rule in rules.rules() {
        let access = if rule.requires_auth {
            "authenticated"
        } else {
            "public"
        };
        println!("[rule] {} -> {access}", rule.pattern);
    }
    println!("[rule] <any other path> -> authenticated");
    Router::new(handlers::default_routes()).dump_routes();
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown() -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handler")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> anyhow::Result<()> {
    // No signal handling off unix; run until killed.
    loop {
        std::thread::park();
    }
}
