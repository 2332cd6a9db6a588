//! Client implementation.
//!
//! The client maintains:
//! - One persistent framed TCP connection to the relay
//! - Its assigned session id (from the welcome handshake)
//! - A local [`WorldView`] kept consistent with server broadcasts

use std::net::SocketAddr;

use anyhow::Context;
use relay_shared::{
    config::RelayConfig,
    net::{ClientEvent, Framed, ServerEvent},
    session::SessionId,
};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::view::WorldView;

/// Client connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Connected,
    Disconnected,
}

/// High-level relay client.
pub struct RelayClient {
    pub session_id: SessionId,
    pub state: ClientState,
    pub view: WorldView,
    conn: Framed,
}

impl RelayClient {
    /// Connects to the relay and completes the welcome/snapshot handshake.
    pub async fn connect(cfg: &RelayConfig) -> anyhow::Result<Self> {
        let server_addr: SocketAddr = cfg.server_addr.parse().context("parse server_addr")?;

        info!(server = %server_addr, name = %cfg.player_name, "Connecting to relay");

        let stream = TcpStream::connect(server_addr)
            .await
            .context("tcp connect")?;
        let mut conn = Framed::new(stream);

        let session_id = match conn.recv().await? {
            ServerEvent::Welcome { id } => id,
            other => anyhow::bail!("expected WELCOME, got {other:?}"),
        };

        let mut view = WorldView::new();
        match conn.recv().await? {
            ServerEvent::CurrentPlayers(players) => {
                view.apply(&ServerEvent::CurrentPlayers(players));
            }
            other => anyhow::bail!("expected CURRENT_PLAYERS, got {other:?}"),
        }

        info!(session = %session_id, players = view.len(), "Connected to relay");

        Ok(Self {
            session_id,
            state: ClientState::Connected,
            view,
            conn,
        })
    }

    /// Sends this session's new position and applies it locally.
    pub async fn send_move(&mut self, x: f32, y: f32) -> anyhow::Result<()> {
        self.conn.send(&ClientEvent::PlayerMoved { x, y }).await?;
        self.view.apply_local_move(self.session_id, x, y);
        Ok(())
    }

    /// Sends the legacy connect announcement.
    pub async fn announce(&mut self) -> anyhow::Result<()> {
        self.conn.send(&ClientEvent::PlayerConnected).await?;
        Ok(())
    }

    /// Waits up to `timeout` for one server event and folds it into the
    /// view. Returns the event for callers that want to inspect it.
    pub async fn poll_event(
        &mut self,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<ServerEvent>> {
        match self.conn.recv_timeout::<ServerEvent>(timeout).await {
            Ok(Some(ev)) => {
                self.view.apply(&ev);
                Ok(Some(ev))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "Relay connection lost");
                self.state = ClientState::Disconnected;
                Ok(None)
            }
        }
    }

    /// Drains events until `timeout` passes with nothing arriving.
    pub async fn drain_events(
        &mut self,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Vec<ServerEvent>> {
        let mut events = Vec::new();
        while let Some(ev) = self.poll_event(timeout).await? {
            events.push(ev);
        }
        Ok(events)
    }

    /// Returns the relay's address.
    pub fn server_peer(&self) -> anyhow::Result<SocketAddr> {
        self.conn.peer_addr()
    }
}
