#![warn(missing_debug_implementations, unsafe_code)]

#[macro_use] extern crate log;
#[macro_use] extern crate crossbeam_channel;
#[macro_use] extern crate derive_more;

mod bootstrap;
mod common;
mod communication;
mod consensus;
mod coordinator;
mod errors;
mod failure_detector;
mod leadership;

#[cfg(test)]
mod test_utils;

pub use bootstrap::discover_process_id;
pub use common::{ProcessId, Round, VoteValue, UNASSIGNED_PROCESS_ID};
pub use communication::message::{Envelope, Message, MessageKind, Packet};
pub use communication::{broadcast_message, Transport};
pub use consensus::{ConsensusRound, Decision, RandomVoteSource, VoteSource};
pub use coordinator::configuration::{Group, ProcessConfiguration, ProcessTimings};
pub use coordinator::{Coordinator, CoordinatorWorker};
pub use errors::{new_err, CoordinationError, Result};
pub use failure_detector::{FailureDetector, PeerRecord, MISS_THRESHOLD};
pub use leadership::election::Election;
pub use leadership::role::ElectionRole;
pub use leadership::ElectionTimer;

/// Creates the coordinator of one group member and starts its workers.
pub fn start_process<T, Et, V>(
    config: ProcessConfiguration<T, Et, V>,
) -> Result<(Coordinator<T, Et, V>, CoordinatorWorker)>
where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    let coordinator = Coordinator::new(config)?;
    let worker = coordinator.start()?;

    Ok((coordinator, worker))
}
