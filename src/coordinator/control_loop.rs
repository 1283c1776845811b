use crossbeam_channel::Receiver;

use super::Coordinator;
use crate::communication::message::Message;
use crate::communication::{broadcast_message, Transport};
use crate::consensus::VoteSource;
use crate::leadership::role::ElectionRole;
use crate::leadership::ElectionTimer;

pub(super) fn run_control_loop<T, Et, V>(
    coordinator: Coordinator<T, Et, V>,
    terminate_worker_rx: Receiver<()>,
) where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    info!("Node {} Control loop worker started", coordinator.process_id);
    loop {
        let tick = crossbeam_channel::after(coordinator.timings.control_interval);
        select!(
            recv(terminate_worker_rx) -> _  => {
                info!("Node {} Control loop worker stopped", coordinator.process_id);
                return
            },
            recv(tick) -> _  => control_tick(&coordinator),
        );
    }
}

// One pass: keep a live leader known, elect one otherwise, and run a consensus round as leader.
fn control_tick<T, Et, V>(coordinator: &Coordinator<T, Et, V>)
where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    let process_id = coordinator.process_id;
    let suspected = match coordinator.failure_detector.suspected_set() {
        Ok(suspected) => suspected,
        Err(err) => {
            warn!("Node {} Control tick skipped: {}", process_id, err);
            return;
        }
    };

    let active_peers = coordinator
        .peers
        .iter()
        .filter(|peer| !suspected.contains(*peer))
        .count();

    let election = &coordinator.election;
    if active_peers == 0 {
        if election.known_leader().is_some() || election.is_leader() {
            info!("Node {} No active peers, leader forgotten", process_id);
            election.clear_known_leader();
        } else {
            trace!("Node {} No active peers", process_id);
        }
        return;
    }

    let leader_alive = match election.known_leader() {
        Some(leader_id) => coordinator.is_member(leader_id) && !suspected.contains(&leader_id),
        None => false,
    };

    if !leader_alive {
        if election.role() == ElectionRole::Candidate {
            debug!("Node {} Election attempt is outstanding", process_id);
            return;
        }

        if let Some(leader_id) = election.known_leader() {
            info!("Node {} Leader {} is suspected", process_id, leader_id);
        }
        election.clear_known_leader();

        broadcast_message(&coordinator.transport, process_id, Message::LeaderSearch);
        election.start();
    }

    if election.is_leader() {
        coordinator.consensus.run_as_leader(active_peers + 1);
    }
}
