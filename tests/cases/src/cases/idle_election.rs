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

    // an idle group keeps its leader
    steps::sleep_ms(1_000);
    assert!(cluster.agree_on_leader(&members, 3));
    assert_eq!(vec![3], cluster.leaders());

    cluster.terminate();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_idle_election() {
        crate::cases::idle_election::run()
    }
}
