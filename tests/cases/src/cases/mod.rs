pub mod consensus;
pub mod identity_bootstrap;
pub mod idle_election;
pub mod isolated_leader_returns;
pub mod late_joiner;
pub mod leader_crash;
