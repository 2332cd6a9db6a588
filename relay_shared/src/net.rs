//! Wire protocol and framing.
//!
//! Goals:
//! - One persistent TCP connection per client, carrying length-prefixed
//!   JSON frames in both directions.
//! - A closed set of message variants per direction, dispatched through a
//!   single decode point, instead of open-ended string event names.
//! - Keep serialization explicit and versionable.
//!
//! Event tags on the wire keep the original protocol's names
//! (`CURRENT_PLAYERS`, `NEW_PLAYER`, ...), so a capture of either
//! implementation reads the same.

use anyhow::Context;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
    time,
};

use crate::session::{Session, SessionId};

/// Upper bound on a single frame's payload. A relay message is a handful of
/// sessions at most; anything larger is a corrupt or hostile frame.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Messages the server sends to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// The id assigned to this connection. Sent first, before the snapshot.
    Welcome { id: SessionId },
    /// Full registry snapshot, sent once at connect. Taken after the new
    /// session is inserted, so the joiner sees itself in the map.
    CurrentPlayers(HashMap<SessionId, Session>),
    /// A new session joined.
    NewPlayer(Session),
    /// A session's position changed.
    PlayerMoved(Session),
    /// A session left; payload is the bare id.
    PlayerDisconnect(SessionId),
    /// Verbatim rebroadcast of a client's legacy announcement.
    PlayerConnected(Session),
}

/// Messages clients send to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    /// This session's new position. Stored as-is; bounds checking is not
    /// the relay's job.
    PlayerMoved { x: f32, y: f32 },
    /// Legacy announcement with no payload; the server rebroadcasts the
    /// sender's session to everyone else.
    PlayerConnected,
}

/// Connection over TCP with length-prefixed (u32 BE) JSON frames.
#[derive(Debug)]
pub struct Framed {
    stream: TcpStream,
}

impl Framed {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn send<T: Serialize>(&mut self, msg: &T) -> anyhow::Result<()> {
        let frame = encode_frame(msg)?;
        self.stream.write_all(&frame).await.context("tcp write")?;
        Ok(())
    }

    pub async fn recv<T: DeserializeOwned>(&mut self) -> anyhow::Result<T> {
        let mut len_buf = [0u8; 4];
        self.stream
            .read_exact(&mut len_buf)
            .await
            .context("tcp read len")?;
        let len = u32::from_be_bytes(len_buf) as usize;
        anyhow::ensure!(len <= MAX_FRAME_LEN, "frame too large: {len} bytes");
        let mut payload = vec![0u8; len];
        self.stream
            .read_exact(&mut payload)
            .await
            .context("tcp read payload")?;
        serde_json::from_slice(&payload).context("deserialize msg")
    }

    /// Receives a frame within the given timeout; `None` on timeout.
    pub async fn recv_timeout<T: DeserializeOwned>(
        &mut self,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<T>> {
        match time::timeout(timeout, self.recv()).await {
            Ok(Ok(msg)) => Ok(Some(msg)),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }

    /// Splits into independently owned read/write halves, so a reader task
    /// and a writer task can run concurrently on one connection.
    pub fn into_split(self) -> (FrameReader, FrameWriter) {
        let (rd, wr) = self.stream.into_split();
        (FrameReader { inner: rd }, FrameWriter { inner: wr })
    }

    pub fn peer_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }
}

/// Read half of a [`Framed`] connection.
#[derive(Debug)]
pub struct FrameReader {
    inner: OwnedReadHalf,
}

impl FrameReader {
    /// Reads one raw frame. Errors here are transport-level (peer gone,
    /// oversized frame); decoding is a separate step so a malformed payload
    /// does not have to cost the connection.
    pub async fn recv_frame(&mut self) -> anyhow::Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        self.inner
            .read_exact(&mut len_buf)
            .await
            .context("tcp read len")?;
        let len = u32::from_be_bytes(len_buf) as usize;
        anyhow::ensure!(len <= MAX_FRAME_LEN, "frame too large: {len} bytes");
        let mut payload = vec![0u8; len];
        self.inner
            .read_exact(&mut payload)
            .await
            .context("tcp read payload")?;
        Ok(payload)
    }

    pub async fn recv<T: DeserializeOwned>(&mut self) -> anyhow::Result<T> {
        let payload = self.recv_frame().await?;
        serde_json::from_slice(&payload).context("deserialize msg")
    }
}

/// Write half of a [`Framed`] connection.
#[derive(Debug)]
pub struct FrameWriter {
    inner: OwnedWriteHalf,
}

impl FrameWriter {
    pub async fn send<T: Serialize>(&mut self, msg: &T) -> anyhow::Result<()> {
        let frame = encode_frame(msg)?;
        self.inner.write_all(&frame).await.context("tcp write")?;
        Ok(())
    }
}

/// TCP server listener producing [`Framed`] connections.
pub struct FrameListener {
    listener: TcpListener,
}

impl FrameListener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(Framed, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        Ok((Framed::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

fn encode_frame<T: Serialize>(msg: &T) -> anyhow::Result<BytesMut> {
    let payload = serde_json::to_vec(msg).context("serialize msg")?;
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Convenience codec helpers.
pub fn encode_to_bytes<T: Serialize>(msg: &T) -> anyhow::Result<Bytes> {
    let payload = serde_json::to_vec(msg).context("serialize")?;
    Ok(Bytes::from(payload))
}

pub fn decode_from_bytes<T: DeserializeOwned>(b: &[u8]) -> anyhow::Result<T> {
    serde_json::from_slice(b).context("deserialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SPAWN_X;

    #[test]
    fn server_event_roundtrip_bytes() {
        let msg = ServerEvent::NewPlayer(Session::spawn(SessionId(3)));
        let bytes = encode_to_bytes(&msg).unwrap();
        let back: ServerEvent = decode_from_bytes(&bytes).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn client_event_roundtrip_bytes() {
        let msg = ClientEvent::PlayerMoved { x: 1.5, y: -2.0 };
        let bytes = encode_to_bytes(&msg).unwrap();
        let back: ClientEvent = decode_from_bytes(&bytes).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn event_tags_match_wire_names() {
        let moved = serde_json::to_value(ServerEvent::PlayerMoved(Session::spawn(SessionId(1))))
            .unwrap();
        assert_eq!(moved["event"], "PLAYER_MOVED");

        let gone = serde_json::to_value(ServerEvent::PlayerDisconnect(SessionId(9))).unwrap();
        assert_eq!(gone["event"], "PLAYER_DISCONNECT");
        assert_eq!(gone["data"], "9");

        let announce = serde_json::to_value(ClientEvent::PlayerConnected).unwrap();
        assert_eq!(announce["event"], "PLAYER_CONNECTED");
    }

    #[test]
    fn snapshot_serializes_as_id_keyed_object() {
        let mut players = HashMap::new();
        players.insert(SessionId(1), Session::spawn(SessionId(1)));
        players.insert(SessionId(2), Session::spawn(SessionId(2)));

        let v = serde_json::to_value(ServerEvent::CurrentPlayers(players)).unwrap();
        assert_eq!(v["event"], "CURRENT_PLAYERS");
        assert_eq!(v["data"]["1"]["x"], SPAWN_X);
        assert_eq!(v["data"]["2"]["id"], "2");
    }

    #[test]
    fn unknown_event_tag_is_an_error() {
        let raw = br#"{"event":"TELEPORT","data":{"x":1,"y":2}}"#;
        assert!(decode_from_bytes::<ClientEvent>(raw).is_err());
    }

    #[tokio::test]
    async fn framed_messages_survive_the_socket() -> anyhow::Result<()> {
        let listener = FrameListener::bind("127.0.0.1:0".parse()?).await?;
        let addr = listener.local_addr()?;

        let accept = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await?;
            let ev: ClientEvent = conn.recv().await?;
            conn.send(&ServerEvent::Welcome { id: SessionId(1) }).await?;
            Ok::<_, anyhow::Error>(ev)
        });

        let stream = tokio::net::TcpStream::connect(addr).await?;
        let mut conn = Framed::new(stream);
        conn.send(&ClientEvent::PlayerMoved { x: 3.0, y: 4.0 }).await?;
        let welcome: ServerEvent = conn.recv().await?;

        assert_eq!(accept.await??, ClientEvent::PlayerMoved { x: 3.0, y: 4.0 });
        assert_eq!(welcome, ServerEvent::Welcome { id: SessionId(1) });
        Ok(())
    }
}
