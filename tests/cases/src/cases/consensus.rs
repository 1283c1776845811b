use std::time::Duration;

use crate::steps;
use crate::steps::PresetVoteSource;

pub fn run() {
    let members = vec![1, 2, 3];
    let vote_source = PresetVoteSource::new(vec![(1, 10), (2, 200), (3, 30)]);
    let cluster = steps::cluster::start_cluster(members.clone(), members.clone(), vote_source);

    steps::wait_for("process 3 leads the group", Duration::from_secs(5), || {
        cluster.agree_on_leader(&members, 3)
    });

    steps::wait_for("every process records decision 200", Duration::from_secs(5), || {
        members.iter().all(|process_id| {
            cluster
                .coordinator(*process_id)
                .last_decision()
                .map(|decision| decision.value == 200)
                .unwrap_or(false)
        })
    });

    let leader_round = cluster.coordinator(3).known_round();
    for process_id in &members {
        let decision = cluster
            .coordinator(*process_id)
            .last_decision()
            .expect("decision is recorded");

        assert!(decision.round >= 1);
        assert!(decision.round <= leader_round + 1);
    }

    cluster.terminate();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_consensus() {
        crate::cases::consensus::run()
    }
}
