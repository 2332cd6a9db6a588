//! `relay_server`
//!
//! Server-side systems:
//! - Authoritative session registry (single source of truth)
//! - Per-connection reader/writer tasks
//! - Single relay task that owns the registry and fans out broadcasts
//!
//! Networking model:
//! - One persistent TCP connection per client, length-prefixed JSON frames
//! - All sends are fire-and-forget; transport errors are treated as
//!   disconnects

pub mod registry;
pub mod server;

pub use server::RelayServer;
