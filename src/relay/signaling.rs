//! Signaling message schema
//!
//! Peers send `{"to": <id>, "event": <name>, "data": <payload>}` and receive
//! `{"from": <id>, "event": <name>, "data": <payload>}`. The payload is never
//! interpreted by the relay.

use super::room::PeerId;
use super::RelayError;
use serde::{Deserialize, Serialize};

/// Negotiation events the relay forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalEvent {
    /// SDP offer
    CreateOffer,
    /// SDP answer
    CreateAnswer,
    /// ICE candidate
    AddIceCandidate,
}

impl SignalEvent {
    pub const ALL: [SignalEvent; 3] = [
        SignalEvent::CreateOffer,
        SignalEvent::CreateAnswer,
        SignalEvent::AddIceCandidate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalEvent::CreateOffer => "createOffer",
            SignalEvent::CreateAnswer => "createAnswer",
            SignalEvent::AddIceCandidate => "addIceCandidate",
        }
    }

    /// Match a wire event name; unknown names yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

/// Message received from a peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Target peer id within the sender's room. Any integer is accepted;
    /// ids no peer can hold (negative ones) are dropped by the router.
    pub to: i64,
    /// Event name, kept raw so unknown events can be dropped rather than rejected
    pub event: String,
    /// Opaque negotiation payload
    pub data: String,
}

impl InboundMessage {
    /// Parse a text frame
    pub fn from_json(text: &str) -> Result<Self, RelayError> {
        serde_json::from_str(text)
            .map_err(|e| RelayError::MalformedMessage(format!("Invalid signaling message: {}", e)))
    }

    /// Parse a binary frame carrying the same JSON document
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RelayError> {
        serde_json::from_slice(bytes)
            .map_err(|e| RelayError::MalformedMessage(format!("Invalid signaling message: {}", e)))
    }
}

/// Message relayed to the addressed peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Sender peer id
    pub from: PeerId,
    pub event: SignalEvent,
    pub data: String,
}

impl OutboundMessage {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, RelayError> {
        serde_json::to_string(self)
            .map_err(|e| RelayError::MalformedMessage(format!("Failed to serialize message: {}", e)))
    }
}
