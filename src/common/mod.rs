use crossbeam_channel::{Receiver, Sender};
use std::thread;
use std::thread::JoinHandle;

/// Unique identifier of a group member. Ordering is the Bully tie-break: the highest id wins.
pub type ProcessId = u64;

/// Sender id used by a process that has not been assigned an identity yet.
pub const UNASSIGNED_PROCESS_ID: ProcessId = 0;

pub fn run_worker_thread<T: Send + 'static, F: Fn(T) + Send + 'static>(
    worker: F,
    params: T,
) -> JoinHandle<()> {
    thread::spawn(move || worker(params))
}

/// Handle of a background worker: its thread and the channel requesting its termination.
#[derive(Debug)]
pub struct Worker {
    pub join_handle: JoinHandle<()>,
    pub terminate_worker_tx: Sender<()>,
}

pub fn run_worker<T: Send + 'static, F: Fn(T, Receiver<()>) + Send + 'static>(
    worker: F,
    params: T,
) -> Worker {
    let (terminate_worker_tx, terminate_worker_rx): (Sender<()>, Receiver<()>) =
        crossbeam_channel::unbounded();

    let join_handle = thread::spawn(move || worker(params, terminate_worker_rx));

    Worker {
        join_handle,
        terminate_worker_tx,
    }
}

#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    pub fn new(workers: Vec<Worker>) -> WorkerPool {
        WorkerPool { workers }
    }

    pub fn terminate(&self) {
        for worker in &self.workers {
            let send_result = worker.terminate_worker_tx.send(());
            if send_result.is_err() {
                error!("Cannot send termination signal")
            }
        }
    }

    pub fn join(self) {
        for worker in self.workers {
            let join_result = worker.join_handle.join();
            if join_result.is_err() {
                error!("Worker returned an error")
            }
        }
    }
}

/// Consensus round number, incremented by the leader once per round it initiates.
pub type Round = u64;

/// Value proposed by a voter and decided by the leader.
pub type VoteValue = i64;
