//! Cognito Private Proxy - Main Entry Point

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cognito_proxy::shutdown::{run_with_graceful_shutdown, wait_for_signal, ShutdownTrigger};
use cognito_proxy::{app, Blueprint, Config, ProxyState, SystemConfig};
use rust_common::{init_tracing, TracingConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "cognito-proxy", version, about = "Private-network Cognito passthrough proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the proxy (default)
    Serve,
    /// Print the provisioning resource graph as JSON
    Blueprint {
        /// Read the system config from this file instead of the environment
        #[arg(long)]
        config: Option<PathBuf>,
        /// Pretty-print
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Blueprint { config, pretty } => blueprint(config, pretty),
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    init_tracing(
        &TracingConfig::default()
            .with_service_name("cognito-proxy")
            .with_log_level(&config.server.log_level)
            .with_json_output(config.server.log_json),
    );

    let state = ProxyState::from_config(&config)?;
    let application = app(&config, state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        %addr,
        origin = %config.system.allowed_origin(),
        boundary = %config.system.private_network_id,
        "Cognito proxy listening"
    );

    let (trigger, drain_signal) = ShutdownTrigger::new();
    let graceful = trigger.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.fire();
    });

    let server = axum::serve(listener, application).with_graceful_shutdown(graceful.recv());
    run_with_graceful_shutdown(
        async move { server.await },
        drain_signal,
        config.server.shutdown_timeout,
    )
    .await
    .context("server error")?;

    info!("Cognito proxy stopped");
    Ok(())
}

fn blueprint(path: Option<PathBuf>, pretty: bool) -> anyhow::Result<()> {
    let system = match path {
        Some(path) => SystemConfig::from_file(&path)?,
        None => Config::from_env()?.system,
    };
    let graph = Blueprint::build(&system)?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&graph)?
    } else {
        serde_json::to_string(&graph)?
    };
    println!("{rendered}");
    Ok(())
}
