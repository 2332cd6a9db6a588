//! Standalone headless client binary.
//!
//! Usage:
//!   cargo run -p relay_client -- [--addr 127.0.0.1:3001] [--name Player]
//!
//! Connects to the relay, prints every broadcast it receives, and accepts
//! simple commands on stdin.
//!
//! Console commands:
//!   move <x> <y> - Send a position update
//!   announce     - Send the legacy connect announcement
//!   status       - Show session id and known players
//!   quit         - Exit client

use std::env;
use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Context;
use relay_client::client::{ClientState, RelayClient};
use relay_shared::config::RelayConfig;
use tokio::sync::mpsc;
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
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

fn exec_console(client: &RelayClient, line: &str) -> Option<ConsoleAction> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["move", x, y] => match (x.parse::<f32>(), y.parse::<f32>()) {
            (Ok(x), Ok(y)) => Some(ConsoleAction::Move(x, y)),
            _ => {
                println!("Usage: move <x> <y>");
                None
            }
        },
        ["announce"] => Some(ConsoleAction::Announce),
        ["status"] => {
            if let Ok(addr) = client.server_peer() {
                println!("Server: {addr}");
            }
            println!("Session: {}", client.session_id);
            println!("State: {:?}", client.state);
            let mut ids: Vec<_> = client.view.players().values().collect();
            ids.sort_by_key(|s| s.id);
            for s in ids {
                println!("  {}: x={} y={} flipX={}", s.id, s.x, s.y, s.flip_x);
            }
            None
        }
        ["quit"] | ["exit"] => Some(ConsoleAction::Quit),
        [] => None,
        _ => {
            println!("Commands: move <x> <y> | announce | status | quit");
            None
        }
    }
}

enum ConsoleAction {
    Move(f32, f32),
    Announce,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    let mut client = RelayClient::connect(&cfg).await.context("connect")?;
    client.announce().await?;

    // Stdin reader thread feeding the async loop.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() {
                break;
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Connected as {}. Type 'status' for info, 'quit' to exit.", client.session_id);

    'outer: while client.state == ClientState::Connected {
        while let Ok(line) = console_rx.try_recv() {
            match exec_console(&client, &line) {
                Some(ConsoleAction::Move(x, y)) => client.send_move(x, y).await?,
                Some(ConsoleAction::Announce) => client.announce().await?,
                Some(ConsoleAction::Quit) => break 'outer,
                None => {}
            }
        }

        if let Some(ev) = client.poll_event(Duration::from_millis(100)).await? {
            info!(?ev, "event");
        }
    }

    Ok(())
}
