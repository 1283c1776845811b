use crossbeam_channel::Receiver;
use std::time::Instant;

use super::FailureDetector;
use crate::communication::message::Message;
use crate::communication::{broadcast_message, Transport};

pub(super) fn send_heartbeats<T: Transport>(detector: FailureDetector<T>, terminate_worker_rx: Receiver<()>) {
    info!("Node {} Heartbeat sender worker started", detector.process_id);
    loop {
        // advisory only: a lost heartbeat is recovered by the next one
        broadcast_message(&detector.transport, detector.process_id, Message::Heartbeat);
        detector.sweep_at(Instant::now());

        let heartbeat_timeout = crossbeam_channel::after(detector.heartbeat_interval);
        select!(
            recv(terminate_worker_rx) -> res  => {
                if res.is_err() {
                    error!("Abnormal exit for heartbeat sender worker");
                }
                break
            },
            recv(heartbeat_timeout) -> _  => {},
        );
    }
    info!("Node {} Heartbeat sender worker stopped", detector.process_id);
}
