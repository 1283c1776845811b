//! Leader-driven collect-and-decide agreement, crash faults only.
//!
//! The leader broadcasts `CONSENSUS_START(round)`, seeds its own vote and collects
//! `CONSENSUS_VOTE(round, value)` until the expected voters answered or the window closed.
//! The decision is the maximum collected value, announced with `CONSENSUS_DECIDE`.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{ProcessId, Round, VoteValue};
use crate::communication::message::{Message, Packet};
use crate::communication::{broadcast_message, Transport};

/// Application-defined vote producer.
pub trait VoteSource: Send + Sync + Clone + 'static {
    fn vote(&self, process_id: ProcessId, round: Round) -> VoteValue;
}

/// Votes `r * r * id` for a random `r` in `1..=100`, saturating at `VoteValue::MAX`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomVoteSource;

impl VoteSource for RandomVoteSource {
    fn vote(&self, process_id: ProcessId, _round: Round) -> VoteValue {
        let r: VoteValue = rand::thread_rng().gen_range(1..=100);
        let id = VoteValue::try_from(process_id).unwrap_or(VoteValue::MAX);

        (r * r).saturating_mul(id)
    }
}

/// Outcome of a consensus round as recorded by a process.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "round {} value {}", round, value)]
pub struct Decision {
    pub round: Round,
    pub value: VoteValue,
}

#[derive(Debug, Default)]
struct ConsensusState {
    known_round: Round,
    // Round whose votes the leader is currently collecting.
    collecting: Option<Round>,
    tally: HashMap<ProcessId, VoteValue>,
    last_decision: Option<Decision>,
}

#[derive(Clone, Debug)]
pub struct ConsensusRound<T: Transport, V: VoteSource> {
    process_id: ProcessId,
    transport: T,
    vote_source: V,
    window: Duration,
    state: Arc<Mutex<ConsensusState>>,
    vote_arrived_tx: Sender<()>,
    vote_arrived_rx: Receiver<()>,
}

impl<T: Transport, V: VoteSource> ConsensusRound<T, V> {
    pub fn new(process_id: ProcessId, transport: T, vote_source: V, window: Duration) -> ConsensusRound<T, V> {
        let (vote_arrived_tx, vote_arrived_rx) = crossbeam_channel::unbounded();

        ConsensusRound {
            process_id,
            transport,
            vote_source,
            window,
            state: Arc::new(Mutex::new(ConsensusState::default())),
            vote_arrived_tx,
            vote_arrived_rx,
        }
    }

    pub fn known_round(&self) -> Round {
        self.state.lock().known_round
    }

    pub fn last_decision(&self) -> Option<Decision> {
        self.state.lock().last_decision
    }

    /// Runs one round as the leader and returns the decided value. Blocks at most for the
    /// collection window; returns earlier once `expected_voters` votes (own vote included) are in.
    pub fn run_as_leader(&self, expected_voters: usize) -> Option<VoteValue> {
        while self.vote_arrived_rx.try_recv().is_ok() {}

        let round = {
            let mut state = self.state.lock();
            state.known_round += 1;
            let round = state.known_round;

            state.tally.clear();
            let own_vote = self.vote_source.vote(self.process_id, round);
            state.tally.insert(self.process_id, own_vote);
            state.collecting = Some(round);

            round
        };

        info!(
            "Node {} Consensus round {} started, expecting {} voters",
            self.process_id, round, expected_voters
        );
        broadcast_message(
            &self.transport,
            self.process_id,
            Message::ConsensusStart { round },
        );

        let window = crossbeam_channel::after(self.window);
        loop {
            if self.state.lock().tally.len() >= expected_voters {
                debug!("Node {} All expected votes for round {} arrived", self.process_id, round);
                break;
            }

            select!(
                recv(self.vote_arrived_rx) -> _ => continue,
                recv(window) -> _ => break,
            );
        }

        let decision = {
            let mut state = self.state.lock();
            state.collecting = None;
            let tally = std::mem::take(&mut state.tally);

            info!(
                "Node {} Consensus round {} closed with {} votes: {:?}",
                self.process_id,
                round,
                tally.len(),
                tally
            );

            let decision = tally.values().max().map(|&value| Decision { round, value });
            if decision.is_some() {
                state.last_decision = decision;
            }
            decision
        };

        match decision {
            Some(decision) => {
                info!("Node {} Decided {}", self.process_id, decision);
                broadcast_message(
                    &self.transport,
                    self.process_id,
                    Message::ConsensusDecide {
                        value: decision.value,
                    },
                );
                Some(decision.value)
            }
            None => {
                warn!("Node {} No votes collected in round {}", self.process_id, round);
                None
            }
        }
    }

    /// Handles the consensus messages; other messages are ignored. Never blocks.
    pub fn on_message(&self, packet: &Packet) {
        if packet.sender_id == self.process_id {
            return;
        }

        match packet.message {
            Message::ConsensusStart { round } => self.vote(packet.sender_id, round),
            Message::ConsensusVote { round, value } => {
                self.collect_vote(packet.sender_id, round, value)
            }
            Message::ConsensusDecide { value } => self.record_decision(packet.sender_id, value),
            _ => {}
        }
    }

    fn vote(&self, leader_id: ProcessId, round: Round) {
        {
            let mut state = self.state.lock();
            if round > state.known_round {
                state.known_round = round;
            }
        }

        let value = self.vote_source.vote(self.process_id, round);
        debug!(
            "Node {} Voting {} in round {} started by Node {}",
            self.process_id, value, round, leader_id
        );
        broadcast_message(
            &self.transport,
            self.process_id,
            Message::ConsensusVote { round, value },
        );
    }

    fn collect_vote(&self, voter_id: ProcessId, round: Round, value: VoteValue) {
        {
            let mut state = self.state.lock();
            if state.collecting != Some(round) {
                trace!(
                    "Node {} Vote of Node {} for round {} ignored",
                    self.process_id,
                    voter_id,
                    round
                );
                return;
            }

            // a repeated vote replaces the previous one
            state.tally.insert(voter_id, value);
        }

        if self.vote_arrived_tx.send(()).is_err() {
            error!("Node {} Cannot signal vote arrival", self.process_id);
        }
    }

    fn record_decision(&self, leader_id: ProcessId, value: VoteValue) {
        let mut state = self.state.lock();
        let decision = Decision {
            round: state.known_round,
            value,
        };

        info!(
            "Node {} Leader {} decided {}",
            self.process_id, leader_id, decision
        );
        state.last_decision = Some(decision);
    }

    #[cfg(test)]
    fn tally(&self) -> HashMap<ProcessId, VoteValue> {
        self.state.lock().tally.clone()
    }
}
