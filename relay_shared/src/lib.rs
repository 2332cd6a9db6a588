//! `relay_shared`
//!
//! Shared libraries used by both the relay server and client.
//!
//! Design goals:
//! - Clear separation of concerns (session model, wire protocol, config).
//! - Explicit, versionable serialization.
//! - No `unsafe`.

pub mod config;
pub mod net;
pub mod session;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::net::*;
    pub use crate::session::*;
}
