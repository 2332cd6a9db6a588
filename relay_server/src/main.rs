//! Standalone relay server binary.
//!
//! Usage:
//!   cargo run -p relay_server -- [--addr 127.0.0.1:3001]
//!
//! The server listens for client connections, tracks player positions in
//! memory, and rebroadcasts join/leave/move events to all other clients.
//! All state is lost on restart; clients are expected to reconnect.

use std::env;

use anyhow::Context;
use relay_server::RelayServer;
use relay_shared::config::RelayConfig;
use tracing::info;

fn parse_args() -> RelayConfig {
    let mut cfg = RelayConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(addr = %cfg.server_addr, "Starting relay server");

    let server = RelayServer::bind(cfg).await.context("bind relay server")?;
    let local = server.local_addr()?;
    info!(%local, "Server listening");

    server.run().await
}
