//! signal-relay - WebRTC signaling relay
//!
//! Peers join named rooms over WebSocket and exchange offers, answers and ICE
//! candidates addressed to one another by peer id.

pub mod config;
pub mod relay;
pub mod transport;
pub mod web;

// Re-exports
pub use config::Config;
pub use relay::{InboundMessage, OutboundMessage, PeerId, RelayError, RoomRegistry, SignalEvent};
pub use transport::{ConnectionHandle, JoinedPeer};
pub use web::SharedState;
