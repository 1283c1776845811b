use std::time::Duration;

use bully::{Message, Packet, Transport};

use crate::steps;
use crate::steps::PresetVoteSource;

pub fn run() {
    let group = vec![1, 2, 3, 4];
    let mut cluster =
        steps::cluster::start_cluster(group.clone(), vec![1, 2, 3], PresetVoteSource::default());

    steps::wait_for("process 3 leads the running processes", Duration::from_secs(5), || {
        cluster.agree_on_leader(&[1, 2, 3], 3)
    });

    let observer = cluster.bus.connect();
    let observed_rx = observer.inbound_rx();

    cluster.start_process(4);

    steps::wait_for("process 4 adopts leader 3", Duration::from_secs(5), || {
        cluster.coordinator(4).known_leader() == Some(3)
    });

    steps::sleep_ms(1_000);
    assert!(cluster.agree_on_leader(&group, 3));

    let observed: Vec<Packet> = observed_rx
        .try_iter()
        .filter_map(|data| Packet::decode(&data).ok())
        .collect();

    assert!(observed.contains(&Packet::new(4, Message::LeaderSearch)));
    assert!(observed.contains(&Packet::new(3, Message::LeaderAck)));
    // a candidate always broadcasts ELECTION
    assert!(!observed.contains(&Packet::new(4, Message::Election)));

    cluster.terminate();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_late_joiner() {
        crate::cases::late_joiner::run()
    }
}
