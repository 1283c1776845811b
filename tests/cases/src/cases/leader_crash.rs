use std::time::Duration;

use crate::steps;
use crate::steps::PresetVoteSource;

pub fn run() {
    let members = vec![1, 2, 3];
    let cluster =
        steps::cluster::start_cluster(members.clone(), members.clone(), PresetVoteSource::default());

    steps::wait_for("process 3 leads the group", Duration::from_secs(5), || {
        cluster.agree_on_leader(&members, 3)
    });

    cluster.crash(3);

    steps::wait_for("processes 1 and 2 suspect 3", Duration::from_secs(5), || {
        [1, 2].iter().all(|process_id| {
            cluster
                .coordinator(*process_id)
                .suspected()
                .map(|suspected| suspected.contains(&3))
                .unwrap_or(false)
        })
    });

    steps::wait_for("process 2 takes over", Duration::from_secs(5), || {
        cluster.agree_on_leader(&[1, 2], 2)
    });

    // cut off from every peer, 3 stops considering itself the leader
    steps::wait_for("process 3 steps down", Duration::from_secs(5), || {
        !cluster.coordinator(3).is_leader()
    });

    cluster.terminate();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_leader_crash() {
        crate::cases::leader_crash::run()
    }
}
