//! Transport layer for signal-relay
//!
//! Handles peer WebSocket connections: the per-peer connection handle and
//! the signaling connection lifecycle.

pub mod connection;
pub mod signaling_server;

pub use connection::{ConnectionHandle, Outbox};
pub use signaling_server::{handle_signaling_connection, ConnectionState, JoinedPeer};
