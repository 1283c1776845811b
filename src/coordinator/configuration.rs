use std::collections::BTreeSet;
use std::time::Duration;

use crate::common::ProcessId;
use crate::communication::Transport;
use crate::consensus::VoteSource;
use crate::errors::{new_err, Result};
use crate::leadership::ElectionTimer;

/// Timing parameters of a process.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ProcessTimings {
    /// Heartbeat period `t`.
    pub heartbeat_interval: Duration,
    /// Assumed maximum one-way network delay `d`.
    pub max_network_delay: Duration,
    /// Period of the control loop.
    pub control_interval: Duration,
    /// Maximum time a leader collects votes in one consensus round.
    pub consensus_window: Duration,
    /// How long the identity bootstrap listens for I_AM replies.
    pub discovery_window: Duration,
}

impl Default for ProcessTimings {
    fn default() -> Self {
        ProcessTimings {
            heartbeat_interval: Duration::from_secs(1),
            max_network_delay: Duration::from_secs(2),
            control_interval: Duration::from_secs(2),
            consensus_window: Duration::from_secs(3),
            discovery_window: Duration::from_secs(2),
        }
    }
}

impl ProcessTimings {
    fn validate(&self) -> Result<()> {
        let timings = [
            ("heartbeat_interval", self.heartbeat_interval),
            ("control_interval", self.control_interval),
            ("consensus_window", self.consensus_window),
        ];

        for (name, duration) in timings.iter() {
            if *duration == Duration::from_secs(0) {
                return new_err(
                    "Invalid process timings".to_string(),
                    format!("{} must be greater than zero", name),
                );
            }
        }

        Ok(())
    }
}

/// Configured group membership, self included.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Group {
    members: BTreeSet<ProcessId>,
}

impl Group {
    pub fn new(members: Vec<ProcessId>) -> Group {
        let mut group = Group {
            members: BTreeSet::new(),
        };

        for member in members {
            if !group.members.insert(member) {
                warn!("Group configuration - duplicate member: {}", member)
            }
        }

        group
    }

    pub fn contains(&self, process_id: ProcessId) -> bool {
        self.members.contains(&process_id)
    }

    pub fn all_members(&self) -> Vec<ProcessId> {
        self.members.iter().copied().collect()
    }

    pub fn peers(&self, process_id: ProcessId) -> Vec<ProcessId> {
        self.members
            .iter()
            .copied()
            .filter(|&member| member != process_id)
            .collect()
    }

    pub fn max_member(&self) -> Option<ProcessId> {
        self.members.iter().next_back().copied()
    }
}

#[derive(Clone, Debug)]
pub struct ProcessConfiguration<T, Et, V>
where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    pub process_id: ProcessId,
    pub group: Group,
    pub transport: T,
    pub election_timer: Et,
    pub vote_source: V,
    pub timings: ProcessTimings,
}

impl<T, Et, V> ProcessConfiguration<T, Et, V>
where
    T: Transport,
    Et: ElectionTimer,
    V: VoteSource,
{
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.group.contains(self.process_id) {
            return new_err(
                format!("Node {} is not a group member", self.process_id),
                format!("members: {:?}", self.group.all_members()),
            );
        }

        self.timings.validate()
    }
}
