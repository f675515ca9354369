use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, error};
use lru::LruCache;
use parking_lot::Mutex;

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

/// Number of decoded chunks kept in the read cache.
pub const READ_CACHE_CAPACITY: usize = 256;

/// A store writing one LZ4-compressed file per chunk under a root directory.
///
/// Files are named `c.<x>.<y>.<z>.chunk`. Each write goes to a temporary file
/// first and is renamed into place, so a crash mid-flush never leaves a
/// half-written chunk behind.
pub struct FileWorldStore {
    root: PathBuf,
    registry: Arc<VoxelTypeRegistry>,
    queue: WriteQueue,
    cache: Mutex<LruCache<ChunkCoordinate, VoxelGrid>>,
}

impl FileWorldStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    ///
    /// # Arguments
    /// * `root` - Directory holding the chunk files
    /// * `registry` - Voxel types, needed to size inventory payloads
    pub fn open(root: impl AsRef<Path>, registry: Arc<VoxelTypeRegistry>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let capacity = NonZeroUsize::new(READ_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Ok(FileWorldStore {
            root,
            registry,
            queue: WriteQueue::default(),
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// The file holding the chunk at `coordinate`.
    pub fn chunk_path(&self, coordinate: ChunkCoordinate) -> PathBuf {
        self.root.join(format!(
            "c.{}.{}.{}.chunk",
            coordinate.x, coordinate.y, coordinate.z
        ))
    }

    fn write_file(&self, coordinate: ChunkCoordinate, grid: &VoxelGrid) -> Result<(), StoreError> {
        let compressed = lz4_flex::compress_prepend_size(&encode_grid(grid, &self.registry));
        let path = self.chunk_path(coordinate);
        let tmp = path.with_extension("chunk.tmp");
        fs::write(&tmp, compressed)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl WorldStore for FileWorldStore {
    fn has_chunk(&self, coordinate: ChunkCoordinate) -> bool {
        self.queue.contains(coordinate)
            || self.cache.lock().contains(&coordinate)
            || self.chunk_path(coordinate).is_file()
    }

    fn read_chunk(&self, coordinate: ChunkCoordinate) -> Result<VoxelGrid, StoreError> {
        if let Some(grid) = self.queue.get(coordinate) {
            return Ok(grid);
        }
        if let Some(grid) = self.cache.lock().get(&coordinate) {
            return Ok(grid.clone());
        }

        let compressed = fs::read(self.chunk_path(coordinate))?;
        let bytes = lz4_flex::decompress_size_prepended(&compressed)
            .map_err(|e| StoreError::Compression(format!("chunk {}: {}", coordinate, e)))?;
        let grid = decode_grid(coordinate, &bytes, &self.registry)?;
        self.cache.lock().put(coordinate, grid.clone());
        Ok(grid)
    }

    fn write_chunk(&self, coordinate: ChunkCoordinate, grid: VoxelGrid) {
        self.cache.lock().pop(&coordinate);
        self.queue.push(coordinate, grid);
    }

    fn flush(&self) -> Result<usize, StoreError> {
        let _flushing = self.queue.lock_flush();
        let mut written = 0;
        let mut first_error = None;

        for write in self.queue.snapshot() {
            match self.write_file(write.coordinate, &write.grid) {
                Ok(()) => {
                    self.queue.complete(&write);
                    written += 1;
                }
                Err(err) => {
                    error!("Failed to write chunk {}: {}, keeping it queued", write.coordinate, err);
                    first_error.get_or_insert(err);
                }
            }
        }

        if written > 0 {
            debug!("Flushed {} chunks to {}", written, self.root.display());
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    fn pending_writes(&self) -> usize {
        self.queue.len()
    }
}
