use crossbeam_channel::Receiver;

use crate::common::ProcessId;
use crate::errors::Result;

pub mod message;

#[cfg(test)]
pub(crate) mod mock;

use message::{Message, Packet};

/// Group broadcast channel. No ordering or delivery guarantees are expected: envelopes may be
/// lost, duplicated or reordered, and a sender usually receives its own broadcasts back.
pub trait Transport: Send + Sync + Clone + 'static {
    /// Sends the raw envelope to every member of the group.
    fn broadcast(&self, data: Vec<u8>) -> Result<()>;

    /// Returns the channel with raw envelopes delivered to this member.
    fn inbound_rx(&self) -> Receiver<Vec<u8>>;
}

/// Encodes and broadcasts the message. Failures are logged and reported as `false`; the
/// message is never retried.
pub fn broadcast_message<T: Transport>(transport: &T, sender_id: ProcessId, message: Message) -> bool {
    let packet = Packet::new(sender_id, message);

    let data = match packet.encode() {
        Ok(data) => data,
        Err(err) => {
            error!("Node {} cannot encode {}: {}", sender_id, packet.message, err);
            return false;
        }
    };

    match transport.broadcast(data) {
        Ok(()) => {
            trace!("Node {} broadcast {}", sender_id, packet.message);
            true
        }
        Err(err) => {
            warn!("Node {} cannot broadcast {}: {}", sender_id, packet.message, err);
            false
        }
    }
}
