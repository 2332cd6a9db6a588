//! Session model.
//!
//! A `Session` is the server-side record of one connected player: its id,
//! its current position, and a facing flag. Sessions exist exactly as long
//! as their connection is open; nothing here is ever persisted.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default spawn position for a newly connected session.
pub const SPAWN_X: f32 = 50.0;
/// See [`SPAWN_X`].
pub const SPAWN_Y: f32 = 100.0;

/// Identifies a connected session.
///
/// Ids are allocated by the server's registry, are unique for the lifetime
/// of the process, and are never reused after disconnect. On the wire they
/// travel as strings so the registry snapshot can be a plain JSON object
/// keyed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u32>()
            .map(SessionId)
            .map_err(|_| de::Error::custom(format!("invalid session id: {s:?}")))
    }
}

/// One connected player's replicated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub x: f32,
    pub y: f32,
    /// Facing flag. Declared in the replicated shape but never mutated by
    /// any server code path; clients receive it as created.
    #[serde(rename = "flipX")]
    pub flip_x: bool,
}

impl Session {
    /// Creates a session at the default spawn position.
    pub fn spawn(id: SessionId) -> Self {
        Self {
            id,
            x: SPAWN_X,
            y: SPAWN_Y,
            flip_x: false,
        }
    }
}
