use bully::{Result, Transport};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Endpoint {
    inbound_tx: Sender<Vec<u8>>,
    isolated: Arc<AtomicBool>,
}

/// In-memory broadcast medium shared by the processes of one test cluster. Every broadcast is
/// delivered to all connected endpoints, the sender included, like a multicast loopback.
#[derive(Clone, Debug, Default)]
pub struct InProcBus {
    endpoints: Arc<RwLock<Vec<Endpoint>>>,
}

impl InProcBus {
    pub fn new() -> InProcBus {
        InProcBus::default()
    }

    /// Attaches a new endpoint to the bus.
    pub fn connect(&self) -> InProcTransport {
        let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();
        let isolated = Arc::new(AtomicBool::new(false));

        let mut endpoints = self.endpoints.write();
        endpoints.push(Endpoint {
            inbound_tx,
            isolated: isolated.clone(),
        });

        InProcTransport {
            endpoint_index: endpoints.len() - 1,
            bus: self.clone(),
            isolated,
            inbound_rx,
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.read().len()
    }

    fn deliver(&self, data: &[u8]) {
        let endpoints = self.endpoints.read();
        for (index, endpoint) in endpoints.iter().enumerate() {
            if endpoint.isolated.load(Ordering::SeqCst) {
                continue;
            }

            if endpoint.inbound_tx.send(data.to_vec()).is_err() {
                trace!("Endpoint {} is gone", index);
            }
        }
    }
}

/// Endpoint of an [`InProcBus`]. An isolated endpoint neither sends nor receives, which looks
/// like a crashed process to the rest of the group.
#[derive(Clone, Debug)]
pub struct InProcTransport {
    endpoint_index: usize,
    bus: InProcBus,
    isolated: Arc<AtomicBool>,
    inbound_rx: Receiver<Vec<u8>>,
}

impl InProcTransport {
    pub fn isolate(&self) {
        info!("Endpoint {} isolated", self.endpoint_index);
        self.isolated.store(true, Ordering::SeqCst);
    }

    pub fn rejoin(&self) {
        info!("Endpoint {} rejoined", self.endpoint_index);
        self.isolated.store(false, Ordering::SeqCst);
    }

    pub fn is_isolated(&self) -> bool {
        self.isolated.load(Ordering::SeqCst)
    }
}

impl Transport for InProcTransport {
    fn broadcast(&self, data: Vec<u8>) -> Result<()> {
        if self.is_isolated() {
            trace!("Endpoint {} is isolated, broadcast dropped", self.endpoint_index);
            return Ok(());
        }

        self.bus.deliver(&data);

        Ok(())
    }

    fn inbound_rx(&self) -> Receiver<Vec<u8>> {
        self.inbound_rx.clone()
    }
}
