use std::collections::BTreeMap;

use bully::{Coordinator, CoordinatorWorker, Group, ProcessConfiguration, ProcessId, VoteSource};
use bully_modules::{FixedElectionTimer, InProcBus, InProcTransport};

use super::{case_timings, election_timeout_ms};

pub type CaseCoordinator<V> = Coordinator<InProcTransport, FixedElectionTimer, V>;

pub struct CaseProcess<V: VoteSource> {
    pub coordinator: CaseCoordinator<V>,
    pub transport: InProcTransport,
    worker: CoordinatorWorker,
}

pub struct CaseCluster<V: VoteSource> {
    pub bus: InProcBus,
    pub group: Vec<ProcessId>,
    pub vote_source: V,
    pub processes: BTreeMap<ProcessId, CaseProcess<V>>,
}

/// Starts the listed processes of the group on a fresh in-process bus.
pub fn start_cluster<V: VoteSource>(
    group: Vec<ProcessId>,
    running: Vec<ProcessId>,
    vote_source: V,
) -> CaseCluster<V> {
    let mut cluster = CaseCluster {
        bus: InProcBus::new(),
        group,
        vote_source,
        processes: BTreeMap::new(),
    };

    for process_id in running {
        cluster.start_process(process_id);
    }

    cluster
}

impl<V: VoteSource> CaseCluster<V> {
    pub fn start_process(&mut self, process_id: ProcessId) {
        let transport = self.bus.connect();
        let config = ProcessConfiguration {
            process_id,
            group: Group::new(self.group.clone()),
            transport: transport.clone(),
            election_timer: FixedElectionTimer::new(election_timeout_ms()),
            vote_source: self.vote_source.clone(),
            timings: case_timings(),
        };

        let (coordinator, worker) = bully::start_process(config).expect("can start a process");
        info!("--Process {} started", process_id);

        self.processes.insert(
            process_id,
            CaseProcess {
                coordinator,
                transport,
                worker,
            },
        );
    }

    pub fn coordinator(&self, process_id: ProcessId) -> &CaseCoordinator<V> {
        &self.processes[&process_id].coordinator
    }

    /// Cuts the process off the bus, which the rest of the group observes as a crash.
    pub fn crash(&self, process_id: ProcessId) {
        info!("--Process {} crashed", process_id);
        self.processes[&process_id].transport.isolate();
    }

    pub fn recover(&self, process_id: ProcessId) {
        info!("--Process {} recovered", process_id);
        self.processes[&process_id].transport.rejoin();
    }

    pub fn leaders(&self) -> Vec<ProcessId> {
        self.processes
            .iter()
            .filter(|(_, process)| process.coordinator.is_leader())
            .map(|(process_id, _)| *process_id)
            .collect()
    }

    /// True when every listed process knows `leader_id` and it is the only process in the Leader
    /// role among them.
    pub fn agree_on_leader(&self, members: &[ProcessId], leader_id: ProcessId) -> bool {
        let all_know = members
            .iter()
            .all(|process_id| self.coordinator(*process_id).known_leader() == Some(leader_id));
        let leaders: Vec<ProcessId> = self
            .leaders()
            .into_iter()
            .filter(|process_id| members.contains(process_id))
            .collect();

        all_know && leaders == vec![leader_id]
    }

    pub fn terminate(self) {
        for process in self.processes.values() {
            process.worker.terminate();
        }

        for (_, process) in self.processes {
            process.worker.join();
        }
    }
}
