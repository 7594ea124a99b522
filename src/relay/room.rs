//! Room membership
//!
//! A room maps peer ids to live connection handles. Ids come from a per-room
//! counter and are never reused while the room exists.

use super::RelayError;
use crate::transport::ConnectionHandle;
use log::{debug, error};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Peer identifier, unique within a room
pub type PeerId = u64;

/// One connected client
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: PeerId,
    pub connection: ConnectionHandle,
}

impl Peer {
    pub fn new(id: PeerId, connection: ConnectionHandle) -> Self {
        Self { id, connection }
    }
}

#[derive(Debug, Default)]
struct Membership {
    peers: HashMap<PeerId, Peer>,
    /// Set when the last peer leaves; a closed room accepts no new peers
    closed: bool,
}

/// A named group of peers
#[derive(Debug)]
pub struct Room {
    name: String,
    next_id: AtomicU64,
    members: RwLock<Membership>,
    created_at: Instant,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: AtomicU64::new(0),
            members: RwLock::new(Membership::default()),
            created_at: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Allocate the next peer id
    pub fn next_peer_id(&self) -> PeerId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert a peer under its id
    pub fn add_peer(&self, peer: Peer) -> Result<(), RelayError> {
        let mut members = self.members.write();
        if members.closed {
            return Err(RelayError::RoomNotFound(self.name.clone()));
        }
        if members.peers.contains_key(&peer.id) {
            error!("Peer id {} allocated twice in room {}", peer.id, self.name);
            return Err(RelayError::DuplicatePeer(peer.id));
        }
        members.peers.insert(peer.id, peer);
        Ok(())
    }

    /// Remove a peer; returns the number of peers left.
    ///
    /// Removing the last peer closes the room.
    pub fn remove_peer(&self, id: PeerId) -> usize {
        let mut members = self.members.write();
        if members.peers.remove(&id).is_some() {
            debug!("Peer {} removed from room {}", id, self.name);
            if members.peers.is_empty() {
                members.closed = true;
            }
        }
        members.peers.len()
    }

    pub fn count(&self) -> usize {
        self.members.read().peers.len()
    }

    /// Connection handle of a peer, cloned out of the lock
    pub fn lookup(&self, id: PeerId) -> Option<ConnectionHandle> {
        self.members.read().peers.get(&id).map(|peer| peer.connection.clone())
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.members.read().peers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_closed(&self) -> bool {
        self.members.read().closed
    }
}
