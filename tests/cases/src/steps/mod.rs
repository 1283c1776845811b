use bully::{ProcessId, ProcessTimings, Round, VoteSource, VoteValue};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub mod cluster;

pub fn sleep_ms(milliseconds: u64) {
    thread::sleep(Duration::from_millis(milliseconds));
}

/// Scaled-down timings: a crashed peer is suspected after roughly 700 ms.
pub fn case_timings() -> ProcessTimings {
    ProcessTimings {
        heartbeat_interval: Duration::from_millis(100),
        max_network_delay: Duration::from_millis(100),
        control_interval: Duration::from_millis(200),
        consensus_window: Duration::from_millis(300),
        discovery_window: Duration::from_millis(300),
    }
}

pub fn election_timeout_ms() -> u64 {
    300
}

/// Polls the condition until it holds or the timeout expires.
pub fn wait_for<F: Fn() -> bool>(description: &str, timeout: Duration, condition: F) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        if Instant::now() > deadline {
            panic!("timed out waiting for: {}", description);
        }
        sleep_ms(20);
    }

    info!("--Condition met: {}", description);
}

/// Votes a preset value per process, `id * 10` for processes without one.
#[derive(Clone, Debug, Default)]
pub struct PresetVoteSource {
    votes: Arc<HashMap<ProcessId, VoteValue>>,
}

impl PresetVoteSource {
    pub fn new(votes: Vec<(ProcessId, VoteValue)>) -> PresetVoteSource {
        PresetVoteSource {
            votes: Arc::new(votes.into_iter().collect()),
        }
    }
}

impl VoteSource for PresetVoteSource {
    fn vote(&self, process_id: ProcessId, _round: Round) -> VoteValue {
        match self.votes.get(&process_id) {
            Some(value) => *value,
            None => process_id as VoteValue * 10,
        }
    }
}
