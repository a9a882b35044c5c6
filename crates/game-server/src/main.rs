//! Game server binary: loads the configuration and serves WebSocket clients.

use clap::Parser;
use game_server::server::{serve, spawn_timeout_forwarder};
use game_server::{AppState, DiscardHistory, HistorySink, ServerConfig, SessionRegistry, SqliteHistory};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Real-time two-player chess server.
#[derive(Parser)]
#[command(name = "game-server")]
#[command(about = "Hosts clocked two-player chess games over WebSocket")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = ServerConfig::DEFAULT_PATH)]
    config: PathBuf,

    /// Port to listen on, overriding the configuration
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = ServerConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let history: Arc<dyn HistorySink> = match &config.history_db {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            tracing::info!("Storing finished games in {}", path.display());
            Arc::new(SqliteHistory::open(path)?)
        }
        None => Arc::new(DiscardHistory),
    };

    let (registry, timeouts) = SessionRegistry::new(history, config.max_timer());
    let state = Arc::new(AppState::new(registry));
    spawn_timeout_forwarder(Arc::clone(&state), timeouts);

    let listener = TcpListener::bind(config.addr()).await?;
    tracing::info!("Game server listening on ws://{}", listener.local_addr()?);
    serve(listener, state).await?;
    Ok(())
}
