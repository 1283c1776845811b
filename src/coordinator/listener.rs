use crossbeam_channel::Receiver;

use super::Coordinator;
use crate::communication::message::Packet;
use crate::communication::Transport;
use crate::consensus::VoteSource;
use crate::leadership::ElectionTimer;

pub(super) fn listen_inbound<T, Et, V>(
    coordinator: Coordinator<T, Et, V>,
    terminate_worker_rx: Receiver<()>,
) where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    let inbound_rx = coordinator.transport.inbound_rx();

    info!("Node {} Inbound listener worker started", coordinator.process_id);
    loop {
        select!(
            recv(terminate_worker_rx) -> _  => {
                info!("Node {} Inbound listener worker stopped", coordinator.process_id);
                return
            },
            recv(inbound_rx) -> res  => {
                let data = match res {
                    Ok(data) => data,
                    Err(err) => {
                        error!("Node {} Inbound channel closed: {}", coordinator.process_id, err);
                        return
                    }
                };

                match Packet::decode(&data) {
                    Ok(packet) => coordinator.on_message(&packet),
                    Err(err) => debug!("Node {} Inbound packet dropped: {}", coordinator.process_id, err),
                }
            },
        );
    }
}
