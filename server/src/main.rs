use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use todo_server::logging::init_logging;
use todo_server::{open_store, router, serve, CliOverrides, ServerConfig, TodoService};

/// REST server for todo items.
#[derive(Debug, Parser)]
#[command(name = "todo-server", version)]
struct Cli {
    /// Configuration file (defaults to ./todo-server.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Use SQLite storage at this path (`:memory:` for a private database).
    #[arg(long)]
    database: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;

    init_logging(&config.log_filter).context("failed to initialise logging")?;
    info!(
        address = %config.bind_address(),
        backend = ?config.storage.backend,
        "configuration loaded"
    );

    let store = open_store(&config.storage).context("failed to open todo store")?;
    let service = Arc::new(TodoService::new(store));

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "listening");

    serve(listener, router(service), shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}
