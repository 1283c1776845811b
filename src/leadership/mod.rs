use std::time::Duration;

pub mod election;
pub mod role;

/// Source of the election timeout: how long a candidate waits for an ANSWER from a higher id
/// before it declares itself the coordinator.
pub trait ElectionTimer: Send + Sync + Clone + 'static {
    fn next_election_timeout(&self) -> Duration;
}
