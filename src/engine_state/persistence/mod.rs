//! # Persistence
//!
//! Durable chunk storage behind the `WorldStore` trait.
//!
//! Writes are write-behind: `write_chunk` only queues the grid, and `flush`
//! persists the queue as one batch. Queued writes are already visible to
//! `has_chunk` and `read_chunk`, and queuing the same coordinate twice keeps
//! only the newer grid. A write leaves the queue only once its durable copy
//! exists, so readers never fall into the gap between the two. A flush that
//! fails for some chunk keeps that chunk queued for the next attempt.
//!
//! Two stores are provided:
//! - [`MemoryWorldStore`]: encoded chunks in a concurrent map, for tests and
//!   worlds that do not outlive the process
//! - [`FileWorldStore`]: one LZ4-compressed file per chunk

pub mod codec;
pub mod file_store;
pub mod memory_store;

use std::collections::HashMap;

use parking_lot::{Mutex, MutexGuard};

pub use file_store::FileWorldStore;
pub use memory_store::MemoryWorldStore;

use crate::{
    engine_state::voxels::{chunk::voxel_grid::VoxelGrid, coordinates::ChunkCoordinate},
    error::StoreError,
};

/// Durable chunk storage with a write-behind queue.
pub trait WorldStore: Send + Sync {
    /// Whether a chunk is stored or queued at `coordinate`.
    fn has_chunk(&self, coordinate: ChunkCoordinate) -> bool;

    /// The stored or queued grid at `coordinate`.
    fn read_chunk(&self, coordinate: ChunkCoordinate) -> Result<VoxelGrid, StoreError>;

    /// Queues `grid` to be persisted at the next flush.
    fn write_chunk(&self, coordinate: ChunkCoordinate, grid: VoxelGrid);

    /// Persists every queued write.
    ///
    /// # Returns
    /// The number of chunks written, or the first error encountered. Chunks
    /// that failed stay queued.
    fn flush(&self) -> Result<usize, StoreError>;

    /// Number of queued writes.
    fn pending_writes(&self) -> usize;
}

/// A queued write taken by a flush.
#[derive(Debug, Clone)]
pub(crate) struct QueuedWrite {
    pub coordinate: ChunkCoordinate,
    /// Identifies this particular write of the coordinate.
    pub version: u64,
    pub grid: VoxelGrid,
}

#[derive(Debug, Default)]
struct QueueState {
    entries: HashMap<ChunkCoordinate, (u64, VoxelGrid)>,
    next_version: u64,
}

/// Queued writes keyed by coordinate, so the last write per chunk wins.
///
/// A flush copies the entries out and removes each one only after it has been
/// persisted, and only if no newer write replaced it meanwhile. Readers thus
/// find a chunk in the queue until the durable copy exists.
#[derive(Debug, Default)]
pub(crate) struct WriteQueue {
    state: Mutex<QueueState>,
    flushing: Mutex<()>,
}

impl WriteQueue {
    pub(crate) fn push(&self, coordinate: ChunkCoordinate, grid: VoxelGrid) {
        let mut state = self.state.lock();
        state.next_version += 1;
        let version = state.next_version;
        state.entries.insert(coordinate, (version, grid));
    }

    pub(crate) fn get(&self, coordinate: ChunkCoordinate) -> Option<VoxelGrid> {
        self.state
            .lock()
            .entries
            .get(&coordinate)
            .map(|(_, grid)| grid.clone())
    }

    pub(crate) fn contains(&self, coordinate: ChunkCoordinate) -> bool {
        self.state.lock().entries.contains_key(&coordinate)
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Serializes flushes, so an older batch never lands after a newer one.
    pub(crate) fn lock_flush(&self) -> MutexGuard<'_, ()> {
        self.flushing.lock()
    }

    /// Copies every queued write, leaving the queue untouched.
    pub(crate) fn snapshot(&self) -> Vec<QueuedWrite> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|(coordinate, (version, grid))| QueuedWrite {
                coordinate: *coordinate,
                version: *version,
                grid: grid.clone(),
            })
            .collect()
    }

    /// Drops a persisted write unless a newer one was queued for its coordinate.
    ///
    /// # Returns
    /// Whether the entry was removed.
    pub(crate) fn complete(&self, write: &QueuedWrite) -> bool {
        let mut state = self.state.lock();
        match state.entries.get(&write.coordinate) {
            Some((version, _)) if *version == write.version => {
                state.entries.remove(&write.coordinate);
                true
            }
            _ => false,
        }
    }
}
