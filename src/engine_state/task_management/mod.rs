//! # Task Management System
//!
//! This module provides the `GenerationScheduler`, a fixed pool of worker
//! threads that run chunk generation tasks in the background.
//!
//! ## Architecture Overview
//!
//! - Each worker owns a stack of tasks guarded by a mutex and a condition variable
//! - `enqueue()` distributes tasks across the workers round-robin
//! - A worker always pops the most recently pushed task first (LIFO)
//!
//! ## Ordering
//!
//! Callers enqueue chunks in expanding rings around a viewer, farthest first,
//! so popping the newest task first generates the nearest chunks first.
//! TODO: replace the stacks with a priority queue keyed on viewer distance, so
//! a moving viewer does not wait behind chunks queued for its old position.
//!
//! ## Waiting
//!
//! Nothing blocks on I/O. `enqueue()` never blocks or fails, and
//! `wait_until_idle()` simply polls the workers until every stack is empty and
//! no task is running.
//!
//! ## Example Usage
//! ```rust
//! use voxel_world::engine_state::task_management::{
//!     task::{Task, TaskOutcome},
//!     GenerationScheduler,
//! };
//! use voxel_world::error::GenerationError;
//!
//! struct Noop;
//! impl Task for Noop {
//!     fn process(&self) -> Result<TaskOutcome, GenerationError> {
//!         Ok(TaskOutcome::Generated)
//!     }
//!     fn describe(&self) -> String {
//!         "noop".into()
//!     }
//! }
//!
//! let scheduler = GenerationScheduler::new(2);
//! scheduler.enqueue(Box::new(Noop));
//! scheduler.wait_until_idle();
//! assert!(scheduler.is_idle());
//! ```

pub mod task;

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};
use web_time::Instant;

use task::Task;

/// How long an idle worker sleeps before re-checking its stack.
const WORKER_IDLE_WAIT: Duration = Duration::from_millis(10);
/// Poll period of `wait_until_idle`.
const IDLE_POLL: Duration = Duration::from_millis(5);

#[derive(Default)]
struct WorkerState {
    stack: Vec<Box<dyn Task>>,
    running: bool,
    shutdown: bool,
}

type SharedWorker = Arc<(Mutex<WorkerState>, Condvar)>;

struct Worker {
    shared: SharedWorker,
    handle: Option<JoinHandle<()>>,
}

/// Counters shared by all workers.
#[derive(Debug, Default)]
struct SchedulerStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// A fixed pool of generation workers, each with its own LIFO stack.
pub struct GenerationScheduler {
    workers: Vec<Worker>,
    next_worker: AtomicUsize,
    stats: Arc<SchedulerStats>,
}

impl GenerationScheduler {
    /// Creates a scheduler and starts its worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads; at least one is always started
    pub fn new(num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        info!(
            "Starting {} generation workers, available parallelism: {:?}",
            num_workers,
            thread::available_parallelism()
        );

        let stats = Arc::new(SchedulerStats::default());
        let workers = (0..num_workers)
            .map(|index| {
                let shared: SharedWorker = Arc::new((Mutex::new(WorkerState::default()), Condvar::new()));
                let worker_shared = shared.clone();
                let worker_stats = stats.clone();
                let handle = thread::spawn(move || Self::worker_loop(index, worker_shared, worker_stats));
                Worker {
                    shared,
                    handle: Some(handle),
                }
            })
            .collect();

        GenerationScheduler {
            workers,
            next_worker: AtomicUsize::new(0),
            stats,
        }
    }

    fn worker_loop(index: usize, shared: SharedWorker, stats: Arc<SchedulerStats>) {
        let (lock, condvar) = &*shared;
        loop {
            let task = {
                let mut state = lock.lock();
                loop {
                    if let Some(task) = state.stack.pop() {
                        state.running = true;
                        break Some(task);
                    }
                    if state.shutdown {
                        break None;
                    }
                    condvar.wait_for(&mut state, WORKER_IDLE_WAIT);
                }
            };
            let Some(task) = task else {
                debug!("Generation worker {} stopped", index);
                return;
            };

            match catch_unwind(AssertUnwindSafe(|| task.process())) {
                Ok(Ok(outcome)) => {
                    stats.completed.fetch_add(1, Ordering::Relaxed);
                    debug!("Worker {} finished {}: {:?}", index, task.describe(), outcome);
                }
                Ok(Err(err)) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Worker {} failed {}: {}", index, task.describe(), err);
                }
                Err(_) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!("Worker {} panicked while running {}", index, task.describe());
                }
            }

            lock.lock().running = false;
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Schedules `task` on the next worker in round-robin order. Never blocks.
    pub fn enqueue(&self, task: Box<dyn Task>) {
        let index = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        let (lock, condvar) = &*self.workers[index].shared;
        lock.lock().stack.push(task);
        condvar.notify_one();
    }

    /// Tasks queued or running across all workers.
    pub fn pending(&self) -> usize {
        self.workers
            .iter()
            .map(|worker| {
                let state = worker.shared.0.lock();
                state.stack.len() + usize::from(state.running)
            })
            .sum()
    }

    /// Whether every stack is empty and no task is running.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Tasks that finished successfully since start.
    pub fn completed(&self) -> usize {
        self.stats.completed.load(Ordering::Relaxed)
    }

    /// Tasks that returned an error or panicked since start.
    pub fn failed(&self) -> usize {
        self.stats.failed.load(Ordering::Relaxed)
    }

    /// Blocks until the scheduler is idle.
    pub fn wait_until_idle(&self) {
        while !self.is_idle() {
            thread::sleep(IDLE_POLL);
        }
    }

    /// Blocks until the scheduler is idle or `timeout` elapses.
    ///
    /// # Returns
    /// `true` if the scheduler became idle in time.
    pub fn wait_until_idle_timeout(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while !self.is_idle() {
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(IDLE_POLL);
        }
        true
    }

    /// Lets workers finish their stacks, then joins them.
    pub fn shutdown(&mut self) {
        for worker in &self.workers {
            let (lock, condvar) = &*worker.shared;
            lock.lock().shutdown = true;
            condvar.notify_all();
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!("A generation worker exited abnormally");
                }
            }
        }
    }
}

impl Drop for GenerationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
