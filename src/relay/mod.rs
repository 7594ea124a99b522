//! Room relay core
//!
//! This module owns the in-memory state of the relay:
//! - Room registry keyed by room name
//! - Per-room peer membership with monotonic peer ids
//! - Signaling message schema and routing

pub mod registry;
pub mod room;
pub mod router;
pub mod signaling;

pub use registry::RoomRegistry;
pub use room::{Peer, PeerId, Room};
pub use router::route;
pub use signaling::{InboundMessage, OutboundMessage, SignalEvent};

use std::error::Error;
use std::fmt;

/// Relay errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// No room registered under the name
    RoomNotFound(String),
    /// A room with the name already exists
    RoomConflict(String),
    /// Room name is empty
    InvalidRoomName,
    /// Inbound payload failed schema validation
    MalformedMessage(String),
    /// Read or write failure on a peer connection
    Transport(String),
    /// Recipient outbox is full
    PeerBackpressure(PeerId),
    /// Peer id already present in a room (id allocation bug)
    DuplicatePeer(PeerId),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::RoomNotFound(name) => write!(f, "Room not found: {}", name),
            RelayError::RoomConflict(name) => write!(f, "Room already exists: {}", name),
            RelayError::InvalidRoomName => write!(f, "Room name must not be empty"),
            RelayError::MalformedMessage(msg) => write!(f, "Malformed message: {}", msg),
            RelayError::Transport(msg) => write!(f, "Transport error: {}", msg),
            RelayError::PeerBackpressure(id) => write!(f, "Outbox full for peer {}", id),
            RelayError::DuplicatePeer(id) => write!(f, "Duplicate peer id: {}", id),
        }
    }
}

impl Error for RelayError {}
