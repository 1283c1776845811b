use std::time::Duration;

use crate::common::{ProcessId, UNASSIGNED_PROCESS_ID};
use crate::communication::message::{Message, Packet};
use crate::communication::{broadcast_message, Transport};

/// Picks an identity for a process joining without a configured id: broadcasts WHO_IS_THERE,
/// listens for I_AM replies during `window` and returns one above the highest id heard
/// (1 when nobody answered).
///
/// Two processes bootstrapping at the same time may pick the same id.
pub fn discover_process_id<T: Transport>(transport: &T, window: Duration) -> ProcessId {
    let inbound_rx = transport.inbound_rx();
    broadcast_message(transport, UNASSIGNED_PROCESS_ID, Message::WhoIsThere);

    let deadline = crossbeam_channel::after(window);
    let mut highest_id = UNASSIGNED_PROCESS_ID;
    loop {
        select!(
            recv(inbound_rx) -> res => {
                let data = match res {
                    Ok(data) => data,
                    Err(_) => break,
                };

                if let Ok(Packet { sender_id, message: Message::IAm }) = Packet::decode(&data) {
                    highest_id = highest_id.max(sender_id);
                }
            },
            recv(deadline) -> _ => break,
        );
    }

    let process_id = highest_id + 1;
    info!("Process id {} discovered, highest id heard: {}", process_id, highest_id);

    process_id
}
