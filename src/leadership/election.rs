use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

use super::role::{next_role, ElectionAction, ElectionEvent, ElectionRole};
use super::ElectionTimer;
use crate::common::{self, ProcessId};
use crate::communication::message::{Message, Packet};
use crate::communication::{broadcast_message, Transport};

#[derive(Debug, Default)]
struct ElectionState {
    role: ElectionRole,
    known_leader: Option<ProcessId>,
    attempt: u64,
    // Dropped when the outstanding attempt is resolved, waking its campaign early.
    attempt_resolved_tx: Option<Sender<()>>,
}

/// Outstanding election attempt awaiting its resolution.
#[derive(Debug)]
struct Campaign {
    attempt: u64,
    resolved_rx: Receiver<()>,
}

/// Bully election for one process. Role and known leader are guarded together by a single lock.
/// Cloning shares the same state.
#[derive(Clone, Debug)]
pub struct Election<T: Transport, Et: ElectionTimer> {
    process_id: ProcessId,
    max_member: ProcessId,
    transport: T,
    election_timer: Et,
    state: Arc<Mutex<ElectionState>>,
}

impl<T: Transport, Et: ElectionTimer> Election<T, Et> {
    /// `max_member` is the highest id in the configured group; that process wins without waiting.
    pub fn new(
        process_id: ProcessId,
        max_member: ProcessId,
        transport: T,
        election_timer: Et,
    ) -> Election<T, Et> {
        Election {
            process_id,
            max_member,
            transport,
            election_timer,
            state: Arc::new(Mutex::new(ElectionState::default())),
        }
    }

    pub fn role(&self) -> ElectionRole {
        self.state.lock().role
    }

    pub fn is_leader(&self) -> bool {
        self.role() == ElectionRole::Leader
    }

    pub fn known_leader(&self) -> Option<ProcessId> {
        self.state.lock().known_leader
    }

    /// Adopts a leader learned outside the election (leader search acknowledgement). Ignored when
    /// a leader is already known.
    pub fn set_known_leader(&self, leader_id: ProcessId) -> bool {
        let mut state = self.state.lock();
        if state.known_leader.is_some() {
            return false;
        }

        info!("Node {} Leader {} adopted", self.process_id, leader_id);
        state.known_leader = Some(leader_id);
        true
    }

    /// Forgets the known leader. A process holding the Leader role steps down to Normal so that
    /// a later election can run.
    pub fn clear_known_leader(&self) {
        let mut state = self.state.lock();
        if state.known_leader.is_none() && state.role != ElectionRole::Leader {
            return;
        }

        if let Err(err) = self.handle_event(&mut state, ElectionEvent::LeaderReset, None) {
            warn!("Node {} {}", self.process_id, err);
        }
    }

    /// Starts an election attempt and blocks until it is resolved: immediately for the highest
    /// id of the group, otherwise at most for the election timeout. Does nothing while a leader
    /// is known.
    pub fn start(&self) {
        let campaign = {
            let mut state = self.state.lock();
            if let Some(leader_id) = state.known_leader {
                debug!(
                    "Node {} Election not started: leader {} is known",
                    self.process_id, leader_id
                );
                return;
            }

            match self.handle_event(&mut state, ElectionEvent::StartElection, None) {
                Ok(Some(campaign)) => campaign,
                Ok(None) => return,
                Err(err) => {
                    warn!("Node {} {}", self.process_id, err);
                    return;
                }
            }
        };

        info!("Node {} Election started", self.process_id);
        self.campaign(campaign);
    }

    /// Handles ELECTION, ANSWER and COORDINATOR; other messages are ignored. Never blocks: an
    /// attempt started by a message is resolved on its own thread.
    pub fn on_message(&self, packet: &Packet) {
        if packet.sender_id == self.process_id {
            return;
        }

        let from_higher = packet.sender_id > self.process_id;
        let event = match packet.message {
            Message::Election => ElectionEvent::ElectionReceived { from_higher },
            Message::Answer => ElectionEvent::AnswerReceived { from_higher },
            Message::Coordinator => ElectionEvent::CoordinatorReceived { from_higher },
            _ => return,
        };

        let campaign = {
            let mut state = self.state.lock();
            match self.handle_event(&mut state, event, Some(packet.sender_id)) {
                Ok(campaign) => campaign,
                Err(err) => {
                    warn!("Node {} {}", self.process_id, err);
                    None
                }
            }
        };

        if let Some(campaign) = campaign {
            info!(
                "Node {} Applied for election requested by Node {}",
                self.process_id, packet.sender_id
            );
            let election = self.clone();
            common::run_worker_thread(move |campaign| election.campaign(campaign), campaign);
        }
    }

    fn campaign(&self, campaign: Campaign) {
        if self.process_id >= self.max_member {
            self.win(campaign.attempt);
            return;
        }

        let timeout = crossbeam_channel::after(self.election_timer.next_election_timeout());
        select!(
            recv(campaign.resolved_rx) -> _ => {
                debug!("Node {} Election attempt {} resolved", self.process_id, campaign.attempt);
            },
            recv(timeout) -> _ => {
                self.win(campaign.attempt);
            },
        );
    }

    fn win(&self, attempt: u64) {
        let mut state = self.state.lock();
        if state.attempt != attempt || state.role != ElectionRole::Candidate {
            debug!(
                "Node {} Election attempt {} is no longer outstanding",
                self.process_id, attempt
            );
            return;
        }

        if let Err(err) = self.handle_event(&mut state, ElectionEvent::WinElection, None) {
            warn!("Node {} {}", self.process_id, err);
        }
    }

    // Applies the transition and executes its side effects under the state lock.
    fn handle_event(
        &self,
        state: &mut ElectionState,
        event: ElectionEvent,
        sender_id: Option<ProcessId>,
    ) -> crate::errors::Result<Option<Campaign>> {
        let transition = next_role(state.role, event)?;

        let mut campaign = None;
        for action in transition.actions {
            match action {
                ElectionAction::BroadcastElection => {
                    broadcast_message(&self.transport, self.process_id, Message::Election);
                }
                ElectionAction::BroadcastAnswer => {
                    broadcast_message(&self.transport, self.process_id, Message::Answer);
                }
                ElectionAction::BroadcastCoordinator => {
                    broadcast_message(&self.transport, self.process_id, Message::Coordinator);
                }
                ElectionAction::AdoptSenderAsLeader => {
                    if let Some(leader_id) = sender_id {
                        if state.known_leader != Some(leader_id) {
                            info!("Node {} Leader {} adopted", self.process_id, leader_id);
                        }
                        state.known_leader = Some(leader_id);
                    }
                }
                ElectionAction::ClaimLeadership => {
                    info!("Node {} Won the election", self.process_id);
                    state.known_leader = Some(self.process_id);
                }
                ElectionAction::ClearKnownLeader => {
                    if let Some(leader_id) = state.known_leader.take() {
                        info!("Node {} Leader {} forgotten", self.process_id, leader_id);
                    }
                }
                ElectionAction::BeginCampaign => {
                    let (resolved_tx, resolved_rx) = crossbeam_channel::bounded(1);
                    state.attempt += 1;
                    state.attempt_resolved_tx = Some(resolved_tx);
                    campaign = Some(Campaign {
                        attempt: state.attempt,
                        resolved_rx,
                    });
                }
            }
        }

        if transition.role != state.role {
            info!(
                "Node {} Status changed {} -> {} on {}",
                self.process_id, state.role, transition.role, event
            );
            if state.role == ElectionRole::Candidate {
                state.attempt_resolved_tx = None;
            }
            state.role = transition.role;
        }

        Ok(campaign)
    }
}
