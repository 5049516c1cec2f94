//! Parley Relay
//!
//! A lightweight WebSocket relay that provides:
//!
//! 1. **Resumable sessions**: a client that connects with a name is issued a
//!    session ID and user ID. Reconnecting with the session ID (from another
//!    tab, or after a network drop) binds it back to the same identity.
//!
//! 2. **Presence**: every client learns the full roster on connect and is told
//!    when other users come online or go offline. A user with several open
//!    connections is only announced offline when the last one closes.
//!
//! 3. **Private messages**: point-to-point messages are delivered to every
//!    live connection of the recipient and kept in memory, so each roster
//!    entry carries the requester's history with that user.
//!
//! Everything is held in memory for the lifetime of the process.

pub mod error;
pub mod gateway;
pub mod handler;
pub mod message_log;
pub mod presence;
pub mod protocol;
pub mod relay;
pub mod routes;
pub mod session;
pub mod state;

pub use routes::build_router;
pub use state::{RelayConfig, RelayState};
