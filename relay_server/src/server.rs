//! Relay server implementation.
//!
//! All registry mutation happens on one task. Per-connection reader tasks
//! decode frames and forward them into a single event channel; the relay
//! task drains that channel between accepts, so each handler runs to
//! completion before the next and the registry needs no locking. Outbound
//! frames go through a per-client channel and writer task; sends are
//! fire-and-forget.
//!
//! Connection flow:
//! - accept: allocate a session at spawn, send `WELCOME` and the
//!   post-insertion `CURRENT_PLAYERS` snapshot to the joiner, broadcast
//!   `NEW_PLAYER` to everyone else.
//! - move: overwrite the session's position, broadcast `PLAYER_MOVED` to
//!   everyone but the mover. Unknown session (a move racing a disconnect)
//!   is a logged no-op.
//! - disconnect or transport error: remove the session, broadcast the bare
//!   id as `PLAYER_DISCONNECT` to all remaining clients.

use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Context;
use relay_shared::{
    config::RelayConfig,
    net::{decode_from_bytes, ClientEvent, FrameListener, Framed, ServerEvent},
    session::SessionId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::Registry;

/// One decoded occurrence on a session's connection.
enum SessionEvent {
    /// A well-formed client message.
    Client(ClientEvent),
    /// The connection is gone, whether by clean close or transport failure.
    Closed,
}

/// The relay proper: the registry plus the fan-out side of every
/// connection. Owned and mutated by a single task.
struct Relay {
    registry: Registry,
    /// Outbound channel per connected client, keyed like the registry.
    peers: HashMap<SessionId, mpsc::UnboundedSender<ServerEvent>>,
    events_tx: mpsc::UnboundedSender<(SessionId, SessionEvent)>,
}

impl Relay {
    /// Registers a new connection and spawns its reader/writer tasks.
    fn admit(&mut self, conn: Framed, peer: SocketAddr) {
        let session = self.registry.insert();
        let id = session.id;
        let (mut reader, mut writer) = conn.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

        // Handshake goes through the same channel as later broadcasts, so
        // the joiner can never observe an event older than its snapshot.
        let _ = tx.send(ServerEvent::Welcome { id });
        let _ = tx.send(ServerEvent::CurrentPlayers(self.registry.snapshot()));

        self.peers.insert(id, tx);
        self.broadcast_except(id, ServerEvent::NewPlayer(session));

        info!(session = %id, %peer, players = self.registry.len(), "player connected");

        tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                if writer.send(&ev).await.is_err() {
                    // Reader half sees the same broken transport and drives
                    // the disconnect path.
                    break;
                }
            }
        });

        let events = self.events_tx.clone();
        tokio::spawn(async move {
            loop {
                match reader.recv_frame().await {
                    Ok(payload) => match decode_from_bytes::<ClientEvent>(&payload) {
                        Ok(ev) => {
                            if events.send((id, SessionEvent::Client(ev))).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            // Recoverable: drop the frame, keep the session.
                            warn!(session = %id, error = %e, "ignoring malformed frame");
                        }
                    },
                    Err(_) => {
                        let _ = events.send((id, SessionEvent::Closed));
                        break;
                    }
                }
            }
        });
    }

    fn dispatch(&mut self, id: SessionId, ev: SessionEvent) {
        match ev {
            SessionEvent::Client(ClientEvent::PlayerMoved { x, y }) => self.on_move(id, x, y),
            SessionEvent::Client(ClientEvent::PlayerConnected) => self.on_announce(id),
            SessionEvent::Closed => self.on_disconnect(id),
        }
    }

    fn on_move(&mut self, id: SessionId, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            warn!(session = %id, x, y, "rejecting non-finite position");
            return;
        }

        match self.registry.apply_move(id, x, y) {
            Some(session) => {
                debug!(session = %id, x, y, "player moved");
                self.broadcast_except(id, ServerEvent::PlayerMoved(session));
            }
            None => {
                // Move arrived after the session was removed.
                debug!(session = %id, "move for unknown session ignored");
            }
        }
    }

    fn on_announce(&mut self, id: SessionId) {
        if let Some(session) = self.registry.get(id) {
            info!(session = %id, "player announced");
            self.broadcast_except(id, ServerEvent::PlayerConnected(session.clone()));
        }
    }

    fn on_disconnect(&mut self, id: SessionId) {
        self.peers.remove(&id);
        if self.registry.remove(id) {
            info!(session = %id, players = self.registry.len(), "player disconnected");
            self.broadcast_all(ServerEvent::PlayerDisconnect(id));
        }
    }

    /// Sends to every connected client except `skip`. Connect and move
    /// fan-out never echoes the originator.
    fn broadcast_except(&self, skip: SessionId, ev: ServerEvent) {
        for (id, tx) in &self.peers {
            if *id != skip {
                let _ = tx.send(ev.clone());
            }
        }
    }

    /// Sends to every remaining client (disconnect notices).
    fn broadcast_all(&self, ev: ServerEvent) {
        for tx in self.peers.values() {
            let _ = tx.send(ev.clone());
        }
    }
}

/// Presence and position relay server.
pub struct RelayServer {
    pub cfg: RelayConfig,
    listener: FrameListener,
    relay: Relay,
    events_rx: mpsc::UnboundedReceiver<(SessionId, SessionEvent)>,
}

impl RelayServer {
    /// Binds the listening socket with the given config.
    pub async fn bind(cfg: RelayConfig) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.server_addr.parse().context("parse server_addr")?;
        let listener = FrameListener::bind(addr).await?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            cfg,
            listener,
            relay: Relay {
                registry: Registry::new(),
                peers: HashMap::new(),
                events_tx,
            },
            events_rx,
        })
    }

    /// Returns the local address (after binding).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections and relays events until the process exits.
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            listener,
            mut relay,
            mut events_rx,
            ..
        } = self;

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (conn, peer) = accepted?;
                    relay.admit(conn, peer);
                }
                Some((id, ev)) = events_rx.recv() => {
                    relay.dispatch(id, ev);
                }
            }
        }
    }
}

/// Helper for tests: bind to an ephemeral port.
pub async fn bind_ephemeral() -> anyhow::Result<(RelayServer, RelayConfig)> {
    let cfg = RelayConfig {
        server_addr: "127.0.0.1:0".to_string(),
        ..Default::default()
    };

    let server = RelayServer::bind(cfg).await?;
    let mut cfg = server.cfg.clone();
    cfg.server_addr = server.local_addr()?.to_string();

    Ok((server, cfg))
}
