//! Long-lived worker pool driving the parallel phases.
//!
//! Workers are spawned once and parked on a condition variable between
//! phases; the coordinator releases them by publishing a new phase epoch and
//! blocks until every worker has reported back idle. A phase is complete
//! only when the queue has drained **and** all workers have returned from
//! their last item; waiting on the queue alone would race with a worker
//! still mid-computation after the final pop.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::simulation::queue::EventQueue;

/// The two parallel sub-stages of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collision,
    Force,
}

/// Per-index phase work. Implementations must uphold partition-by-
/// destination: a call for index `i` may write only the buffers belonging
/// to row/slot `i`.
pub trait PhaseRunner: Send + Sync + 'static {
    fn run(&self, phase: Phase, index: usize);
}

#[derive(Default)]
struct PoolState {
    epoch: u64, // bumped once per released phase
    phase: Option<Phase>,
    idle: usize, // workers done with the current epoch
    shutdown: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    start_cv: Condvar, // coordinator -> workers: new epoch or shutdown
    done_cv: Condvar, // workers -> coordinator: all idle
    size: usize,
}

/// Fixed set of worker threads, woken per phase.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `size` workers that drain `queue` and hand each popped index to
    /// `runner` for the active phase.
    pub fn spawn<R>(size: usize, queue: Arc<EventQueue>, runner: Arc<R>) -> Result<Self>
    where
        R: PhaseRunner,
    {
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState::default()),
            start_cv: Condvar::new(),
            done_cv: Condvar::new(),
            size,
        });

        let mut handles = Vec::with_capacity(size);
        for i in 0..size {
            let worker_shared = Arc::clone(&shared);
            let queue = Arc::clone(&queue);
            let runner = Arc::clone(&runner);
            let spawned = thread::Builder::new()
                .name(format!("rbsim-worker-{i}"))
                .spawn(move || worker_loop(worker_shared, queue, runner));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Wake and join the workers spawned so far before bailing.
                    {
                        let mut state = shared.state.lock().expect("pool state lock poisoned");
                        state.shutdown = true;
                        shared.start_cv.notify_all();
                    }
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(Self {
            shared,
            handles: Mutex::new(handles),
        })
    }

    /// Release all workers into `phase` and block until each one has drained
    /// the queue and reported idle. This is the full barrier between phases.
    pub fn run_phase(&self, phase: Phase) {
        let mut state = self.shared.state.lock().expect("pool state lock poisoned");
        state.epoch = state.epoch.wrapping_add(1);
        state.phase = Some(phase);
        state.idle = 0;
        self.shared.start_cv.notify_all();

        while state.idle < self.shared.size {
            state = self
                .shared
                .done_cv
                .wait(state)
                .expect("pool state lock poisoned");
        }
        state.phase = None;
    }

    /// Wake every worker for termination and join them. A panicked worker is
    /// logged rather than re-raised; the lock poisoning it leaves behind
    /// already makes the engine unusable.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock().expect("pool state lock poisoned");
            state.shutdown = true;
            self.shared.start_cv.notify_all();
        }
        let mut handles = self.handles.lock().expect("pool handle lock poisoned");
        for handle in handles.drain(..) {
            if handle.join().is_err() {
                log::error!("worker thread panicked during shutdown");
            }
        }
    }
}

fn worker_loop<R>(shared: Arc<PoolShared>, queue: Arc<EventQueue>, runner: Arc<R>)
where
    R: PhaseRunner,
{
    let mut seen_epoch = 0u64;
    loop {
        // Park until a new epoch is published (or shutdown).
        let phase = {
            let mut state = shared.state.lock().expect("pool state lock poisoned");
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(phase) = state.phase {
                    if state.epoch != seen_epoch {
                        seen_epoch = state.epoch;
                        break phase;
                    }
                }
                state = shared
                    .start_cv
                    .wait(state)
                    .expect("pool state lock poisoned");
            }
        };

        while let Some(index) = queue.pop() {
            runner.run(phase, index);
        }

        let mut state = shared.state.lock().expect("pool state lock poisoned");
        state.idle += 1;
        if state.idle == shared.size {
            shared.done_cv.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRunner {
        collision: Vec<AtomicUsize>,
        force: Vec<AtomicUsize>,
    }

    impl CountingRunner {
        fn new(n: usize) -> Self {
            Self {
                collision: (0..n).map(|_| AtomicUsize::new(0)).collect(),
                force: (0..n).map(|_| AtomicUsize::new(0)).collect(),
            }
        }
    }

    impl PhaseRunner for CountingRunner {
        fn run(&self, phase: Phase, index: usize) {
            match phase {
                Phase::Collision => self.collision[index].fetch_add(1, Ordering::Relaxed),
                Phase::Force => self.force[index].fetch_add(1, Ordering::Relaxed),
            };
        }
    }

    #[test]
    fn every_index_runs_exactly_once_per_phase() {
        let n = 32;
        let queue = Arc::new(EventQueue::new());
        let runner = Arc::new(CountingRunner::new(n));
        let pool = WorkerPool::spawn(3, Arc::clone(&queue), Arc::clone(&runner))
            .expect("spawn pool");

        for _ in 0..4 {
            queue.push_all(n);
            pool.run_phase(Phase::Collision);
            assert!(queue.is_empty());
            queue.push_all(n);
            pool.run_phase(Phase::Force);
            assert!(queue.is_empty());
        }
        pool.shutdown();

        for i in 0..n {
            assert_eq!(runner.collision[i].load(Ordering::Relaxed), 4);
            assert_eq!(runner.force[i].load(Ordering::Relaxed), 4);
        }
    }

    #[test]
    fn single_worker_pool_completes_phases() {
        let queue = Arc::new(EventQueue::new());
        let runner = Arc::new(CountingRunner::new(4));
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), Arc::clone(&runner))
            .expect("spawn pool");
        queue.push_all(4);
        pool.run_phase(Phase::Collision);
        pool.shutdown();
        assert_eq!(runner.collision[3].load(Ordering::Relaxed), 1);
    }
}
