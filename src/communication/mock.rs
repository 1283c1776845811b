use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::communication::message::{Message, Packet};
use crate::communication::Transport;
use crate::errors::{new_err, Result};

/// Transport that keeps every broadcast packet for inspection.
#[derive(Clone, Debug)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Packet>>>,
    failing: Arc<AtomicBool>,
    inbound_tx: Sender<Vec<u8>>,
    inbound_rx: Receiver<Vec<u8>>,
}

impl RecordingTransport {
    pub fn new() -> RecordingTransport {
        let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();

        RecordingTransport {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
            inbound_tx,
            inbound_rx,
        }
    }

    pub fn sent(&self) -> Vec<Packet> {
        self.sent.lock().clone()
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent().into_iter().map(|packet| packet.message).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn deliver(&self, packet: Packet) {
        self.inbound_tx
            .send(packet.encode().expect("can encode packet"))
            .expect("can deliver packet");
    }
}

impl Transport for RecordingTransport {
    fn broadcast(&self, data: Vec<u8>) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return new_err("Broadcast failed".to_string(), "transport is down".to_string());
        }

        let packet = Packet::decode(&data)?;
        self.sent.lock().push(packet);

        Ok(())
    }

    fn inbound_rx(&self) -> Receiver<Vec<u8>> {
        self.inbound_rx.clone()
    }
}
