//! Filament Daemon - Main entry point
//!
//! Hosts configured LED resources and serves them over HTTP. The `call`
//! subcommand drives a resource on a running daemon.

mod api;
mod config;
mod server;
mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use filament_core::{MemoryStrip, ModelRegistry, Rgb};
use filament_rpc::{HttpChannel, RgbClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::state::{AppState, ResourceManager};

#[derive(Parser, Debug)]
#[command(name = "filament")]
#[command(about = "Addressable LED strip daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "filament.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host the configured resources (default)
    Serve,
    /// Call an operation on a resource hosted by a running daemon
    Call {
        /// Short resource name, e.g. "strip"
        name: String,

        #[command(subcommand)]
        operation: Operation,

        /// Daemon base URL
        #[arg(long, default_value = "http://127.0.0.1:8081")]
        url: String,
    },
}

#[derive(Subcommand, Debug)]
enum Operation {
    /// Show random colors until stopped
    Animate,
    /// Set every pixel to one color
    Fill { red: u8, green: u8, blue: u8 },
    /// Turn every pixel off
    Clear,
    /// End a running animation
    Stop,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Some(Command::Call {
            name,
            operation,
            url,
        }) => call(&url, &name, operation).await,
        Some(Command::Serve) | None => serve(args.config, args.bind).await,
    }
}

async fn serve(config_path: PathBuf, bind: Option<String>) -> Result<()> {
    info!("Filament v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&config_path)?;

    // Override bind address if specified
    if let Some(bind) = bind {
        config.daemon.bind = bind;
    }

    let mut models: ModelRegistry<dyn Rgb> = ModelRegistry::new();
    filament_ws2801::register::<MemoryStrip>(&mut models);

    let manager = Arc::new(ResourceManager::new(models));
    for outcome in manager.apply(&config.components).await {
        if let Err(e) = outcome.result {
            warn!(resource = %outcome.name, error = %e, "Resource not started");
        }
    }

    let state = AppState::new(manager.clone(), config_path);

    #[cfg(unix)]
    spawn_reload_on_hangup(state.clone())?;

    tokio::select! {
        result = server::run(state, &config.daemon.bind, config.daemon.tls.as_ref()) => {
            if let Err(e) = &result {
                error!(error = %e, "Server stopped");
            }
            manager.close_all().await;
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            manager.close_all().await;
            Ok(())
        }
    }
}

#[cfg(unix)]
fn spawn_reload_on_hangup(state: Arc<AppState>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            info!("SIGHUP received, reloading configuration");
            if let Err(e) = state.reload().await {
                warn!(error = %e, "Reload failed, keeping current resources");
            }
        }
    });
    Ok(())
}

async fn call(url: &str, name: &str, operation: Operation) -> Result<()> {
    let client = RgbClient::new(name, Arc::new(HttpChannel::new(url)?));

    let status = match operation {
        Operation::Animate => client.animate().await?,
        Operation::Fill { red, green, blue } => client.fill(red, green, blue).await?,
        Operation::Clear => client.clear().await?,
        Operation::Stop => client.stop().await?,
    };

    println!("{}", status);
    Ok(())
}
