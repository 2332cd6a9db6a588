//! `relay_client`
//!
//! Client-side systems:
//! - Connection management and handshake (welcome + snapshot)
//! - Sending moves and the legacy connect announcement
//! - An eventually consistent local mirror of the server registry
//!
//! Rendering is someone else's problem; this client is exactly the event
//! consumer/producer the wire protocol describes.

pub mod client;
pub mod view;

pub use client::RelayClient;
