//! Peer connection handle
//!
//! The write side of one peer's WebSocket. Deliveries go into a bounded
//! outbox drained by the connection's writer task, so routing never waits on
//! a socket. A full outbox disconnects the peer.

use crate::relay::{OutboundMessage, PeerId, RelayError};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Receiving end of a peer's outbox, owned by its writer task
pub type Outbox = mpsc::Receiver<OutboundMessage>;

/// Cloneable handle to a live peer connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    peer_id: PeerId,
    outbox: mpsc::Sender<OutboundMessage>,
    closed: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Create a handle with an outbox of `capacity` messages
    pub fn new(peer_id: PeerId, capacity: usize) -> (Self, Outbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (closed, _) = watch::channel(false);
        let handle = Self {
            peer_id,
            outbox: tx,
            closed: Arc::new(closed),
        };
        (handle, rx)
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    /// Queue a message for this peer without waiting.
    ///
    /// A full outbox closes the connection and returns `PeerBackpressure`.
    pub fn deliver(&self, message: OutboundMessage) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::Transport(format!("peer {} is closed", self.peer_id)));
        }
        match self.outbox.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.close();
                Err(RelayError::PeerBackpressure(self.peer_id))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                Err(RelayError::Transport(format!("outbox of peer {} dropped", self.peer_id)))
            }
        }
    }

    /// Mark the connection closed; idempotent
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once `close` has been called on any clone of this handle
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
