//! Authoritative session registry.
//!
//! The registry is the single source of truth for who is connected and
//! where they stand. It is owned by the relay task and mutated only from
//! there, so no locking is involved. It is rebuilt empty on every server
//! start; sessions never outlive their connection.

use std::collections::HashMap;

use relay_shared::session::{Session, SessionId};

/// In-memory mapping of all currently connected sessions.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<SessionId, Session>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id and inserts a session at the spawn position.
    /// Ids are monotonic and never reused within a process.
    pub fn insert(&mut self) -> Session {
        self.next_id += 1;
        let id = SessionId(self.next_id);
        let session = Session::spawn(id);
        self.sessions.insert(id, session.clone());
        session
    }

    /// Overwrites a session's position, returning the updated session.
    /// Unknown ids are a no-op: a move can legitimately race a disconnect.
    pub fn apply_move(&mut self, id: SessionId, x: f32, y: f32) -> Option<Session> {
        let session = self.sessions.get_mut(&id)?;
        session.x = x;
        session.y = y;
        Some(session.clone())
    }

    /// Removes a session. Returns false if it was already gone.
    pub fn remove(&mut self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Clones the full registry for a `CURRENT_PLAYERS` snapshot.
    pub fn snapshot(&self) -> HashMap<SessionId, Session> {
        self.sessions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_shared::session::{SPAWN_X, SPAWN_Y};

    #[test]
    fn insert_assigns_unique_ids_and_spawn_position() {
        let mut reg = Registry::new();
        let a = reg.insert();
        let b = reg.insert();

        assert_ne!(a.id, b.id);
        assert_eq!(reg.len(), 2);
        assert_eq!((a.x, a.y), (SPAWN_X, SPAWN_Y));
        assert!(!a.flip_x);
    }

    #[test]
    fn size_tracks_open_sessions() {
        let mut reg = Registry::new();
        let a = reg.insert();
        let b = reg.insert();
        let c = reg.insert();
        assert_eq!(reg.len(), 3);

        assert!(reg.remove(b.id));
        assert_eq!(reg.len(), 2);
        assert!(reg.contains(a.id));
        assert!(!reg.contains(b.id));
        assert!(reg.contains(c.id));

        // Removing again is harmless and does not go negative.
        assert!(!reg.remove(b.id));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_disconnect() {
        let mut reg = Registry::new();
        let a = reg.insert();
        reg.remove(a.id);
        let b = reg.insert();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn apply_move_overwrites_position() {
        let mut reg = Registry::new();
        let a = reg.insert();

        let moved = reg.apply_move(a.id, 10.0, 20.0).unwrap();
        assert_eq!((moved.x, moved.y), (10.0, 20.0));
        let stored = reg.get(a.id).unwrap();
        assert_eq!((stored.x, stored.y), (10.0, 20.0));
    }

    #[test]
    fn apply_move_on_unknown_session_is_noop() {
        let mut reg = Registry::new();
        let a = reg.insert();
        reg.remove(a.id);

        assert!(reg.apply_move(a.id, 1.0, 2.0).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn snapshot_contains_exactly_open_sessions() {
        let mut reg = Registry::new();
        let a = reg.insert();
        let b = reg.insert();
        reg.remove(a.id);

        let snap = reg.snapshot();
        assert_eq!(snap.len(), 1);
        assert!(snap.contains_key(&b.id));
    }
}
