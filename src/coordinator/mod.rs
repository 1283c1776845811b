//! Per-process orchestration: owns the failure detector, the election and the consensus round,
//! dispatches inbound messages to them and drives the periodic control loop.

use std::collections::HashSet;

use crate::common::{self, ProcessId, Round, WorkerPool};
use crate::communication::message::{Message, Packet};
use crate::communication::{broadcast_message, Transport};
use crate::consensus::{ConsensusRound, Decision, VoteSource};
use crate::errors::{new_err, Result};
use crate::failure_detector::FailureDetector;
use crate::leadership::election::Election;
use crate::leadership::role::ElectionRole;
use crate::leadership::ElectionTimer;

pub mod configuration;
mod control_loop;
mod listener;

use configuration::{ProcessConfiguration, ProcessTimings};

/// Coordination layer of one group member. Cloning shares all component state.
#[derive(Clone, Debug)]
pub struct Coordinator<T, Et, V>
where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    process_id: ProcessId,
    peers: Vec<ProcessId>,
    timings: ProcessTimings,
    transport: T,
    failure_detector: FailureDetector<T>,
    election: Election<T, Et>,
    consensus: ConsensusRound<T, V>,
}

impl<T, Et, V> Coordinator<T, Et, V>
where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    pub fn new(config: ProcessConfiguration<T, Et, V>) -> Result<Coordinator<T, Et, V>> {
        config.validate()?;

        let process_id = config.process_id;
        let peers = config.group.peers(process_id);
        let max_member = match config.group.max_member() {
            Some(max_member) => max_member,
            None => return new_err("Empty group".to_string(), String::new()),
        };

        let failure_detector = FailureDetector::new(
            process_id,
            &peers,
            config.transport.clone(),
            config.timings.heartbeat_interval,
            config.timings.max_network_delay,
        );
        let election = Election::new(
            process_id,
            max_member,
            config.transport.clone(),
            config.election_timer,
        );
        let consensus = ConsensusRound::new(
            process_id,
            config.transport.clone(),
            config.vote_source,
            config.timings.consensus_window,
        );

        Ok(Coordinator {
            process_id,
            peers,
            timings: config.timings,
            transport: config.transport,
            failure_detector,
            election,
            consensus,
        })
    }

    /// Starts the heartbeat sender, the inbound listener and the control loop, and announces a
    /// leader search so that an existing leader is adopted without an election.
    pub fn start(&self) -> Result<CoordinatorWorker> {
        let heartbeat_worker = self.failure_detector.start()?;
        let listener_worker = common::run_worker(listener::listen_inbound, self.clone());

        broadcast_message(&self.transport, self.process_id, Message::LeaderSearch);

        let control_worker = common::run_worker(control_loop::run_control_loop, self.clone());

        info!("Node {} started with peers {:?}", self.process_id, self.peers);

        Ok(CoordinatorWorker {
            process_id: self.process_id,
            worker_pool: WorkerPool::new(vec![heartbeat_worker, listener_worker, control_worker]),
        })
    }

    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    pub fn is_leader(&self) -> bool {
        self.election.is_leader()
    }

    pub fn known_leader(&self) -> Option<ProcessId> {
        self.election.known_leader()
    }

    pub fn role(&self) -> ElectionRole {
        self.election.role()
    }

    pub fn suspected(&self) -> Result<HashSet<ProcessId>> {
        self.failure_detector.suspected_set()
    }

    pub fn known_round(&self) -> Round {
        self.consensus.known_round()
    }

    pub fn last_decision(&self) -> Option<Decision> {
        self.consensus.last_decision()
    }

    /// Routes an inbound packet to the failure detector, the leader search, the election and the
    /// consensus round, in this order. Own packets are discarded, and so are election and
    /// consensus messages from processes outside the configured group.
    pub fn on_message(&self, packet: &Packet) {
        if packet.sender_id == self.process_id {
            return;
        }

        if !self.accepts_from(packet) {
            debug!(
                "Node {} {} from non-member {} ignored",
                self.process_id, packet.message, packet.sender_id
            );
            return;
        }

        match &packet.message {
            Message::Heartbeat => self.failure_detector.on_heartbeat(packet.sender_id),
            Message::LeaderSearch => self.answer_leader_search(packet.sender_id),
            Message::LeaderAck => self.adopt_acknowledged_leader(packet.sender_id),
            Message::WhoIsThere => {
                broadcast_message(&self.transport, self.process_id, Message::IAm);
            }
            Message::Test { note } => {
                info!(
                    "Node {} Connectivity check from {}: {}",
                    self.process_id, packet.sender_id, note
                );
            }
            _ => {}
        }

        self.election.on_message(packet);
        self.consensus.on_message(packet);
    }

    pub(crate) fn is_member(&self, process_id: ProcessId) -> bool {
        process_id == self.process_id || self.peers.contains(&process_id)
    }

    // A non-member may look for the group but cannot lead or vote: the failure detector would
    // never track it.
    fn accepts_from(&self, packet: &Packet) -> bool {
        match packet.message {
            Message::Heartbeat
            | Message::LeaderSearch
            | Message::WhoIsThere
            | Message::Test { .. } => true,
            _ => self.is_member(packet.sender_id),
        }
    }

    fn answer_leader_search(&self, searcher_id: ProcessId) {
        if self.election.is_leader() {
            debug!("Node {} Acknowledging leader search of Node {}", self.process_id, searcher_id);
            broadcast_message(&self.transport, self.process_id, Message::LeaderAck);
        }
    }

    fn adopt_acknowledged_leader(&self, leader_id: ProcessId) {
        if let Some(known_leader) = self.election.known_leader() {
            let suspected = self.failure_detector.suspected_set().unwrap_or_default();
            if !suspected.contains(&known_leader) {
                trace!(
                    "Node {} Leader ack of Node {} ignored: leader {} is alive",
                    self.process_id,
                    leader_id,
                    known_leader
                );
                return;
            }

            self.election.clear_known_leader();
        }

        self.election.set_known_leader(leader_id);
    }
}

/// Running workers of a started coordinator.
#[derive(Debug)]
pub struct CoordinatorWorker {
    process_id: ProcessId,
    worker_pool: WorkerPool,
}

impl CoordinatorWorker {
    pub fn terminate(&self) {
        info!("Node {} termination requested", self.process_id);
        self.worker_pool.terminate();
    }

    pub fn join(self) {
        let process_id = self.process_id;
        self.worker_pool.join();
        info!("Node {} shutting down", process_id);
    }

    pub fn shutdown(self) {
        self.terminate();
        self.join();
    }
}
