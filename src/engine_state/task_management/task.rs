//! # Task System Core Traits
//!
//! This module defines the unit of work executed by the `GenerationScheduler`.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `GenerationScheduler::enqueue()`
//! 2. The task lands on one worker's stack (round-robin)
//! 3. The worker pops its most recently pushed task and calls `process()`
//! 4. The outcome is logged; the task writes its results into shared state itself
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker thread
//! - All shared state a task touches must be properly synchronized

use crate::error::GenerationError;

/// How a generation task obtained its chunk's voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Read from the world store.
    Loaded,
    /// Produced by the terrain generator.
    Generated,
    /// The stored copy was corrupt and the generator produced a fresh one.
    Regenerated,
}

/// A unit of work executed on a scheduler worker.
///
/// # Implementation Guidelines
/// - Should own everything it needs (handles, `Arc`s) and be `'static`
/// - Should be bounded and fast; tasks are never cancelled once started
/// - Running a task twice must not overwrite the results of the first run
pub trait Task: Send {
    /// Executes the task on a worker thread.
    ///
    /// # Returns
    /// The outcome on success; errors are logged by the worker.
    fn process(&self) -> Result<TaskOutcome, GenerationError>;

    /// Short human-readable description used in log lines.
    fn describe(&self) -> String;
}
