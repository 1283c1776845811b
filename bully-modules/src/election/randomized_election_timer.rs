use bully::{new_err, ElectionTimer, Result};
use rand::Rng;
use std::time::Duration;

/// Provides a random election timeout within an inclusive range, so that concurrent candidates
/// resolve their attempts at different moments.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RandomizedElectionTimer {
    range_start_ms: u64,
    range_stop_ms: u64,
}

impl RandomizedElectionTimer {
    /// Creates new RandomizedElectionTimer with time range in milliseconds.
    pub fn new(range_start_ms: u64, range_stop_ms: u64) -> Result<RandomizedElectionTimer> {
        if range_start_ms > range_stop_ms || range_stop_ms == 0 {
            return new_err(
                "Invalid election timeout range".to_string(),
                format!(
                    "range_start_ms : {}, range_stop_ms : {}",
                    range_start_ms, range_stop_ms
                ),
            );
        }

        Ok(RandomizedElectionTimer {
            range_start_ms,
            range_stop_ms,
        })
    }
}

impl ElectionTimer for RandomizedElectionTimer {
    fn next_election_timeout(&self) -> Duration {
        let mut rng = rand::thread_rng();

        Duration::from_millis(rng.gen_range(self.range_start_ms..=self.range_stop_ms))
    }
}
