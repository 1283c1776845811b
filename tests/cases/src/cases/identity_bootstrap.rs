use std::time::Duration;

use crate::steps;
use crate::steps::PresetVoteSource;

pub fn run() {
    let members = vec![1, 2, 3];
    let cluster =
        steps::cluster::start_cluster(members.clone(), members.clone(), PresetVoteSource::default());

    let newcomer = cluster.bus.connect();
    let process_id = bully::discover_process_id(&newcomer, Duration::from_millis(500));

    assert_eq!(4, process_id);

    cluster.terminate();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_identity_bootstrap() {
        crate::cases::identity_bootstrap::run()
    }
}
