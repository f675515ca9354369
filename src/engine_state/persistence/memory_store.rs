use std::{io, sync::Arc};

use dashmap::DashMap;
use log::debug;

use super::{
    codec::{decode_grid, encode_grid},
    WorldStore, WriteQueue,
};
use crate::{
    engine_state::voxels::{
        block::block_type::VoxelTypeRegistry, chunk::voxel_grid::VoxelGrid,
        coordinates::ChunkCoordinate,
    },
    error::StoreError,
};

/// A store that keeps encoded chunks in memory.
///
/// Chunks go through the same codec as on disk, so decode failures behave
/// exactly like with a file-backed store.
pub struct MemoryWorldStore {
    registry: Arc<VoxelTypeRegistry>,
    committed: DashMap<ChunkCoordinate, Vec<u8>>,
    queue: WriteQueue,
}

impl MemoryWorldStore {
    /// Creates an empty store.
    pub fn new(registry: Arc<VoxelTypeRegistry>) -> Self {
        MemoryWorldStore {
            registry,
            committed: DashMap::new(),
            queue: WriteQueue::default(),
        }
    }

    /// Stores an already encoded payload, bypassing the queue.
    pub fn insert_raw(&self, coordinate: ChunkCoordinate, bytes: Vec<u8>) {
        self.committed.insert(coordinate, bytes);
    }

    /// Number of flushed chunks.
    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }
}

impl WorldStore for MemoryWorldStore {
    fn has_chunk(&self, coordinate: ChunkCoordinate) -> bool {
        self.queue.contains(coordinate) || self.committed.contains_key(&coordinate)
    }

    fn read_chunk(&self, coordinate: ChunkCoordinate) -> Result<VoxelGrid, StoreError> {
        if let Some(grid) = self.queue.get(coordinate) {
            return Ok(grid);
        }
        let bytes = self
            .committed
            .get(&coordinate)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                StoreError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("chunk {} is not stored", coordinate),
                ))
            })?;
        decode_grid(coordinate, &bytes, &self.registry)
    }

    fn write_chunk(&self, coordinate: ChunkCoordinate, grid: VoxelGrid) {
        self.queue.push(coordinate, grid);
    }

    fn flush(&self) -> Result<usize, StoreError> {
        let _flushing = self.queue.lock_flush();
        let batch = self.queue.snapshot();
        let count = batch.len();
        for write in batch {
            self.committed
                .insert(write.coordinate, encode_grid(&write.grid, &self.registry));
            self.queue.complete(&write);
        }
        if count > 0 {
            debug!("Flushed {} chunks to memory", count);
        }
        Ok(count)
    }

    fn pending_writes(&self) -> usize {
        self.queue.len()
    }
}
