//! Local mirror of the server registry.
//!
//! The server's registry is authoritative; this view converges on it by
//! applying the broadcast events in arrival order. Positions are taken as
//! received, with no interpolation or reconciliation.

use std::collections::HashMap;

use relay_shared::{
    net::ServerEvent,
    session::{Session, SessionId},
};

/// Client-side copy of who is connected and where they stand.
#[derive(Debug, Default)]
pub struct WorldView {
    players: HashMap<SessionId, Session>,
}

impl WorldView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one server event into the view.
    pub fn apply(&mut self, ev: &ServerEvent) {
        match ev {
            ServerEvent::CurrentPlayers(players) => {
                self.players = players.clone();
            }
            ServerEvent::NewPlayer(session) | ServerEvent::PlayerMoved(session) => {
                self.players.insert(session.id, session.clone());
            }
            ServerEvent::PlayerDisconnect(id) => {
                self.players.remove(id);
            }
            // The legacy announcement carries no state change, and the
            // welcome id is connection metadata, not world state.
            ServerEvent::PlayerConnected(_) | ServerEvent::Welcome { .. } => {}
        }
    }

    /// Records a locally initiated move; the server never echoes our own
    /// updates back.
    pub fn apply_local_move(&mut self, id: SessionId, x: f32, y: f32) {
        if let Some(session) = self.players.get_mut(&id) {
            session.x = x;
            session.y = y;
        }
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.players.get(&id)
    }

    pub fn players(&self) -> &HashMap<SessionId, Session> {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
