//! Signaling connection lifecycle
//!
//! Before a peer exists, the upgrade handler resolves the room; a missing
//! room is refused there and no peer is created. From then on each accepted
//! WebSocket moves through `Joined -> Reading -> Closed`:
//! 1. The upgrade handler joins the room, allocating a peer id
//! 2. The read loop decodes one message at a time and relays it
//! 3. On close, error, malformed input or a server-side disconnect the peer
//!    is removed, and the room with it if it is now empty
//!
//! Cleanup lives in `JoinedPeer`'s `Drop`, so it runs on every exit path,
//! including an upgrade that never completes.

use crate::relay::{route, InboundMessage, PeerId, Peer, RelayError, Room};
use crate::transport::connection::{ConnectionHandle, Outbox};
use crate::web::SharedState;
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, Interval};

/// Time allowed for the writer to send its close frame
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle state of a joined peer.
///
/// The connecting stage is the HTTP upgrade handler before
/// [`JoinedPeer::join`] succeeds, so there is no value for it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Registered in the room
    Joined,
    /// Read loop running
    Reading,
    /// Terminal; peer removed
    Closed,
}

/// A peer registered in a room.
///
/// Dropping it removes the peer and, when it was the last one, the room.
pub struct JoinedPeer {
    state: Arc<SharedState>,
    room: Arc<Room>,
    handle: ConnectionHandle,
    outbox: Option<Outbox>,
    connection_state: ConnectionState,
}

impl JoinedPeer {
    /// Join `room_name` with a freshly allocated peer id
    pub fn join(state: &Arc<SharedState>, room_name: &str) -> Result<Self, RelayError> {
        let room = state
            .registry
            .get(room_name)
            .ok_or_else(|| RelayError::RoomNotFound(room_name.to_string()))?;

        let id = room.next_peer_id();
        let (handle, outbox) = ConnectionHandle::new(id, state.config.relay.outbox_capacity);
        room.add_peer(Peer::new(id, handle.clone()))?;
        state.record_connection();
        info!("Peer {} joined room {} ({} peers)", id, room.name(), room.count());

        Ok(Self {
            state: state.clone(),
            room,
            handle,
            outbox: Some(outbox),
            connection_state: ConnectionState::Joined,
        })
    }

    pub fn id(&self) -> PeerId {
        self.handle.peer_id()
    }

    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    /// Take the receiving end of this peer's outbox (once)
    pub fn take_outbox(&mut self) -> Option<Outbox> {
        self.outbox.take()
    }

    /// Route a message from this peer and queue it for the target.
    ///
    /// Returns the target id when the message was queued. Unknown events,
    /// negative targets and unknown targets are dropped without affecting
    /// this peer.
    pub fn relay(&self, message: InboundMessage) -> Option<PeerId> {
        let sender = self.id();
        let Some((target, outbound)) = route(message, sender) else {
            self.state.record_dropped();
            return None;
        };

        let Some(recipient) = self.room.lookup(target) else {
            debug!(
                "No peer {} in room {}, dropping {} from peer {}",
                target,
                self.room.name(),
                outbound.event.as_str(),
                sender
            );
            self.state.record_dropped();
            return None;
        };

        let event = outbound.event;
        match recipient.deliver(outbound) {
            Ok(()) => {
                debug!("Relayed {} from peer {} to peer {}", event.as_str(), sender, target);
                self.state.record_relayed();
                Some(target)
            }
            Err(RelayError::PeerBackpressure(id)) => {
                warn!("Peer {} in room {} is not keeping up, disconnecting", id, self.room.name());
                self.state.record_slow_peer();
                None
            }
            Err(e) => {
                debug!("Dropping {} for peer {}: {}", event.as_str(), target, e);
                self.state.record_dropped();
                None
            }
        }
    }

    /// Remove the peer and, if the room is now empty, the room. Runs once.
    pub fn leave(&mut self) {
        if self.connection_state == ConnectionState::Closed {
            return;
        }
        self.connection_state = ConnectionState::Closed;
        self.handle.close();

        let id = self.id();
        let remaining = self.room.remove_peer(id);
        info!("Peer {} left room {} ({} peers remain)", id, self.room.name(), remaining);
        if remaining == 0 {
            self.state.registry.remove_if_empty(&self.room);
        }
    }
}

impl Drop for JoinedPeer {
    fn drop(&mut self) {
        self.leave();
    }
}

/// Drive a signaling WebSocket until it closes
pub async fn handle_signaling_connection(socket: WebSocket, mut peer: JoinedPeer) {
    let peer_id = peer.id();
    let relay_config = peer.state.config.relay.clone();
    let (ws_sender, mut ws_receiver) = socket.split();

    let Some(outbox) = peer.take_outbox() else {
        warn!("Peer {} has no outbox, closing", peer_id);
        return;
    };

    let ping_interval = non_zero_secs(relay_config.ping_interval_secs);
    let idle_timeout = non_zero_secs(relay_config.idle_timeout_secs);

    let mut send_task = tokio::spawn(run_writer(
        ws_sender,
        outbox,
        peer.handle().clone(),
        ping_interval,
    ));

    let handle = peer.handle().clone();
    peer.connection_state = ConnectionState::Reading;

    loop {
        let next = tokio::select! {
            _ = handle.closed() => {
                info!("Peer {} disconnected by server", peer_id);
                break;
            }
            next = next_frame(&mut ws_receiver, idle_timeout) => next,
        };

        let parsed = match next {
            Ok(Some(Message::Text(text))) => InboundMessage::from_json(text.as_str()),
            Ok(Some(Message::Binary(bytes))) => InboundMessage::from_slice(&bytes),
            Ok(Some(Message::Close(_))) | Ok(None) => {
                info!("Peer {} closed the connection", peer_id);
                break;
            }
            Ok(Some(_)) => continue,
            Err(e) => {
                warn!("Peer {} connection failed: {}", peer_id, e);
                break;
            }
        };

        match parsed {
            Ok(message) => {
                debug!("Peer {} sent {} to peer {}", peer_id, message.event, message.to);
                peer.relay(message);
            }
            Err(e) => {
                warn!("Closing peer {}: {}", peer_id, e);
                peer.state.record_malformed();
                break;
            }
        }
    }

    peer.leave();

    if time::timeout(CLOSE_GRACE * 2, &mut send_task).await.is_err() {
        send_task.abort();
    }

    debug!("Signaling connection handler finished (peer {})", peer_id);
}

/// Wait for the next frame, honouring the idle timeout
async fn next_frame(
    receiver: &mut SplitStream<WebSocket>,
    idle_timeout: Option<Duration>,
) -> Result<Option<Message>, RelayError> {
    let next = match idle_timeout {
        Some(limit) => time::timeout(limit, receiver.next())
            .await
            .map_err(|_| RelayError::Transport(format!("no message for {:?}", limit)))?,
        None => receiver.next().await,
    };
    next.transpose().map_err(|e| RelayError::Transport(e.to_string()))
}

/// Drain the outbox into the socket until the handle is closed
async fn run_writer(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbox: Outbox,
    handle: ConnectionHandle,
    ping_interval: Option<Duration>,
) {
    let peer_id = handle.peer_id();
    let mut ping = ping_interval.map(|period| time::interval_at(Instant::now() + period, period));

    loop {
        tokio::select! {
            biased;
            _ = handle.closed() => break,
            message = outbox.recv() => {
                let Some(message) = message else { break };
                let payload = match message.to_json() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Dropping message for peer {}: {}", peer_id, e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(payload.into())).await {
                    debug!("Write to peer {} failed: {}", peer_id, e);
                    handle.close();
                    break;
                }
            }
            _ = tick(&mut ping) => {
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    debug!("Ping to peer {} failed: {}", peer_id, e);
                    handle.close();
                    break;
                }
            }
        }
    }

    let _ = time::timeout(CLOSE_GRACE, async {
        let _ = sink.send(Message::Close(None)).await;
        let _ = sink.close().await;
    })
    .await;
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
