#[macro_use]
extern crate log;
extern crate bully;
extern crate crossbeam_channel;

mod communication;
mod election;

pub use communication::inproc::{InProcBus, InProcTransport};
pub use communication::network::{UdpMulticastTransport, DEFAULT_GROUP_ADDR, DEFAULT_PORT};
pub use election::fixed_election_timer::FixedElectionTimer;
pub use election::randomized_election_timer::RandomizedElectionTimer;
