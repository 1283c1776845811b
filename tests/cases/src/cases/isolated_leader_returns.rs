use std::time::Duration;

use bully::ProcessId;

use crate::steps;
use crate::steps::cluster::CaseCluster;
use crate::steps::PresetVoteSource;

pub fn run() {
    let members = vec![1, 2, 3];
    let cluster =
        steps::cluster::start_cluster(members.clone(), members.clone(), PresetVoteSource::default());

    steps::wait_for("process 3 leads the group", Duration::from_secs(5), || {
        cluster.agree_on_leader(&members, 3)
    });

    cluster.crash(3);
    steps::wait_for("process 2 takes over", Duration::from_secs(10), || {
        cluster.agree_on_leader(&[1, 2], 2)
    });

    cluster.recover(3);

    // 3 either reclaims leadership or adopts 2 through the leader search
    steps::wait_for("the group agrees on one leader", Duration::from_secs(10), || {
        agreed_leader(&cluster, &members).is_some()
    });

    let leader_id = agreed_leader(&cluster, &members);
    info!("--Leader after recovery: {:?}", leader_id);
    assert!(leader_id == Some(2) || leader_id == Some(3));

    cluster.terminate();
}

fn agreed_leader(cluster: &CaseCluster<PresetVoteSource>, members: &[ProcessId]) -> Option<ProcessId> {
    [2, 3]
        .iter()
        .copied()
        .find(|leader_id| cluster.agree_on_leader(members, *leader_id))
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_isolated_leader_returns() {
        crate::cases::isolated_leader_returns::run()
    }
}
