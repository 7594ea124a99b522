//! Message routing
//!
//! Maps an inbound message and its sender to one outbound delivery.

use super::room::PeerId;
use super::signaling::{InboundMessage, OutboundMessage, SignalEvent};
use log::debug;

/// Route an inbound message from `sender`.
///
/// Returns the target peer id and the message to deliver, or `None` when the
/// event is not one the relay forwards or the target is not a valid peer id.
/// Whether the target exists is resolved by the caller against the room.
pub fn route(msg: InboundMessage, sender: PeerId) -> Option<(PeerId, OutboundMessage)> {
    let Some(event) = SignalEvent::from_wire(&msg.event) else {
        debug!("Dropping unrecognized event {:?} from peer {}", msg.event, sender);
        return None;
    };

    let Ok(target) = PeerId::try_from(msg.to) else {
        debug!("Dropping {} from peer {} to invalid peer id {}", event.as_str(), sender, msg.to);
        return None;
    };

    Some((
        target,
        OutboundMessage {
            from: sender,
            event,
            data: msg.data,
        },
    ))
}
