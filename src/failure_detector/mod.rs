//! Heartbeat based crash-fault detector.
//!
//! Every `t` the detector broadcasts a HEARTBEAT and sweeps its peer table: a peer silent for more
//! than `t + d` collects a miss, and more than [`MISS_THRESHOLD`] consecutive misses make it
//! suspected. Only a fresh heartbeat clears a suspicion.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::{self, ProcessId, Worker};
use crate::communication::Transport;
use crate::errors::{new_err, Result};

mod heartbeat_sender;

/// Number of consecutive missed sweeps a peer may accumulate before it is suspected.
pub const MISS_THRESHOLD: u32 = 3;

/// Liveness record of a single peer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PeerRecord {
    pub process_id: ProcessId,
    pub last_seen_at: Instant,
    pub consecutive_misses: u32,
    pub suspected: bool,
}

impl PeerRecord {
    fn new(process_id: ProcessId, now: Instant) -> PeerRecord {
        PeerRecord {
            process_id,
            last_seen_at: now,
            consecutive_misses: 0,
            suspected: false,
        }
    }

    fn reset(&mut self, now: Instant) {
        self.last_seen_at = now;
        self.consecutive_misses = 0;
        self.suspected = false;
    }

    // Returns true when this sweep turned the peer suspected.
    fn sweep(&mut self, now: Instant, tolerance: Duration) -> bool {
        if now.saturating_duration_since(self.last_seen_at) > tolerance {
            self.consecutive_misses += 1;
        }

        let was_suspected = self.suspected;
        self.suspected = self.consecutive_misses > MISS_THRESHOLD;

        self.suspected && !was_suspected
    }
}

/// Advisory liveness oracle shared between the heartbeat worker, the inbound listener and the
/// control loop. Cloning shares the same peer table.
#[derive(Clone, Debug)]
pub struct FailureDetector<T: Transport> {
    process_id: ProcessId,
    transport: T,
    heartbeat_interval: Duration,
    max_network_delay: Duration,
    peers: Arc<Mutex<BTreeMap<ProcessId, PeerRecord>>>,
    started: Arc<AtomicBool>,
}

impl<T: Transport> FailureDetector<T> {
    /// Creates the detector with one unsuspected record per peer. `peers` must not contain
    /// `process_id`; it is skipped if it does.
    pub fn new(
        process_id: ProcessId,
        peers: &[ProcessId],
        transport: T,
        heartbeat_interval: Duration,
        max_network_delay: Duration,
    ) -> FailureDetector<T> {
        let now = Instant::now();
        let table = peers
            .iter()
            .filter(|&&peer_id| peer_id != process_id)
            .map(|&peer_id| (peer_id, PeerRecord::new(peer_id, now)))
            .collect();

        FailureDetector {
            process_id,
            transport,
            heartbeat_interval,
            max_network_delay,
            peers: Arc::new(Mutex::new(table)),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the periodic heartbeat broadcast and peer sweep.
    pub fn start(&self) -> Result<Worker> {
        if self.started.swap(true, Ordering::SeqCst) {
            return new_err(
                format!("Failure detector of Node {} is already started", self.process_id),
                String::new(),
            );
        }

        Ok(common::run_worker(
            heartbeat_sender::send_heartbeats,
            self.clone(),
        ))
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Peers currently flagged as suspected. Querying a detector that was never started is a
    /// construction-order error.
    pub fn suspected_set(&self) -> Result<HashSet<ProcessId>> {
        if !self.is_started() {
            return new_err(
                format!("Failure detector of Node {} is not started", self.process_id),
                "query the detector after Coordinator::start".to_string(),
            );
        }

        let peers = self.peers.lock();
        Ok(peers
            .values()
            .filter(|record| record.suspected)
            .map(|record| record.process_id)
            .collect())
    }

    pub fn on_heartbeat(&self, sender_id: ProcessId) {
        self.on_heartbeat_at(sender_id, Instant::now())
    }

    pub(crate) fn on_heartbeat_at(&self, sender_id: ProcessId, now: Instant) {
        let mut peers = self.peers.lock();
        match peers.get_mut(&sender_id) {
            Some(record) => {
                if record.suspected {
                    info!("Node {} Peer {} is alive again", self.process_id, sender_id);
                }
                record.reset(now);
            }
            None => trace!(
                "Node {} Heartbeat from unknown process {} ignored",
                self.process_id,
                sender_id
            ),
        }
    }

    /// Copy of the peer record, if the peer is configured.
    pub fn peer_record(&self, peer_id: ProcessId) -> Option<PeerRecord> {
        self.peers.lock().get(&peer_id).copied()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }

    pub(crate) fn sweep_at(&self, now: Instant) {
        let tolerance = self.heartbeat_interval + self.max_network_delay;

        let mut peers = self.peers.lock();
        for record in peers.values_mut() {
            if record.sweep(now, tolerance) {
                warn!(
                    "Node {} Peer {} suspected after {} missed heartbeats",
                    self.process_id, record.process_id, record.consecutive_misses
                );
            }
        }
    }
}
