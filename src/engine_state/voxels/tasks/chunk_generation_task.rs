//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which fills one claimed chunk
//! on a scheduler worker. The store is consulted first; the terrain generator
//! only runs when the store has nothing (or only a corrupt copy) for the chunk.

use std::sync::Arc;

use log::warn;

use crate::{
    engine_state::{
        persistence::WorldStore,
        task_management::task::{Task, TaskOutcome},
        voxels::{chunk::voxel_grid::VoxelGrid, chunk::Chunk, generation::WorldGenerator},
    },
    error::{GenerationError, StoreError},
};

/// Populates a chunk from the store or the generator.
///
/// The chunk must have been claimed with `Chunk::mark_generating` by whoever
/// enqueued the task; the task always releases that claim.
pub struct ChunkGenerationTask {
    /// The chunk to fill.
    chunk: Chunk,
    /// Terrain source for chunks the store does not know.
    generator: Arc<dyn WorldGenerator>,
    /// Optional persistence.
    store: Option<Arc<dyn WorldStore>>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `chunk` - The claimed chunk to populate
    /// * `generator` - The terrain generator
    /// * `store` - The store to load from, if any
    pub fn new(
        chunk: Chunk,
        generator: Arc<dyn WorldGenerator>,
        store: Option<Arc<dyn WorldStore>>,
    ) -> Self {
        ChunkGenerationTask {
            chunk,
            generator,
            store,
        }
    }

    /// Tries the store.
    ///
    /// # Returns
    /// - `Ok(Some(grid))` if the store held a valid copy
    /// - `Ok(None)` if the store has no copy
    /// - `Err(LoadFailure::Corrupt)` if the stored copy must be regenerated
    fn load(&self) -> Result<Option<VoxelGrid>, LoadFailure> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let coordinate = self.chunk.coordinate();
        if !store.has_chunk(coordinate) {
            return Ok(None);
        }
        match store.read_chunk(coordinate) {
            Ok(grid) => Ok(Some(grid)),
            Err(err @ (StoreError::Decode { .. } | StoreError::Compression(_))) => {
                warn!("Stored chunk {} is corrupt ({}), regenerating it", coordinate, err);
                Err(LoadFailure::Corrupt)
            }
            Err(err) => Err(LoadFailure::Store(err)),
        }
    }

    fn run(&self) -> Result<TaskOutcome, GenerationError> {
        let regenerate = match self.load() {
            Ok(Some(grid)) => {
                self.chunk.populate(grid, true)?;
                return Ok(TaskOutcome::Loaded);
            }
            Ok(None) => false,
            Err(LoadFailure::Corrupt) => true,
            Err(LoadFailure::Store(err)) => return Err(err.into()),
        };

        let mut grid = VoxelGrid::empty();
        self.generator.generate(self.chunk.coordinate(), &mut grid);
        // Generated voxels are unsaved, which also replaces a corrupt stored copy.
        self.chunk.populate(grid, false)?;
        Ok(if regenerate {
            TaskOutcome::Regenerated
        } else {
            TaskOutcome::Generated
        })
    }
}

/// Why the store could not provide a chunk.
enum LoadFailure {
    Corrupt,
    Store(StoreError),
}

/// Releases the generation claim when dropped, including while a panicking
/// generator unwinds. After a successful `populate` the claim is already gone
/// and the release changes nothing.
struct ClaimGuard<'a>(&'a Chunk);

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.0.abort_generation();
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Result<TaskOutcome, GenerationError> {
        let _claim = ClaimGuard(&self.chunk);
        self.run()
    }

    fn describe(&self) -> String {
        format!("generation of chunk {}", self.chunk.coordinate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        persistence::{codec::encode_grid, MemoryWorldStore},
        voxels::{
            block::{block_type::VoxelTypeRegistry, Voxel},
            coordinates::{ChunkCoordinate, LocalPosition},
            generation::FlatGenerator,
        },
    };

    fn claimed(coordinate: ChunkCoordinate) -> Chunk {
        let chunk = Chunk::new(coordinate);
        assert!(chunk.mark_generating());
        chunk
    }

    fn flat() -> Arc<dyn WorldGenerator> {
        Arc::new(FlatGenerator::new(3, 0))
    }

    #[test]
    fn generates_without_store() {
        let chunk = claimed(ChunkCoordinate::new(0, 0, 0));
        let task = ChunkGenerationTask::new(chunk.clone(), flat(), None);
        assert_eq!(task.process().unwrap(), TaskOutcome::Generated);
        assert!(chunk.is_generated());
        assert!(!chunk.is_generating());
        assert!(chunk.flags().save_dirty);
        assert_eq!(chunk.get_voxel(LocalPosition::new(0, 2, 0)), Some(Voxel::new(0)));
    }

    #[test]
    fn prefers_the_store() {
        let registry = Arc::new(VoxelTypeRegistry::builtin());
        let store = Arc::new(MemoryWorldStore::new(registry));
        let coordinate = ChunkCoordinate::new(4, 0, 4);
        let mut stored = VoxelGrid::empty();
        stored.set(LocalPosition::new(1, 1, 1), Some(Voxel::new(3)));
        store.write_chunk(coordinate, stored);

        let chunk = claimed(coordinate);
        let task = ChunkGenerationTask::new(chunk.clone(), flat(), Some(store));
        assert_eq!(task.process().unwrap(), TaskOutcome::Loaded);
        assert_eq!(chunk.get_voxel(LocalPosition::new(1, 1, 1)), Some(Voxel::new(3)));
        assert_eq!(chunk.get_voxel(LocalPosition::new(0, 0, 0)), None);
        assert!(!chunk.flags().save_dirty);
    }

    #[test]
    fn corrupt_store_copy_is_regenerated() {
        let registry = Arc::new(VoxelTypeRegistry::builtin());
        let store = Arc::new(MemoryWorldStore::new(registry.clone()));
        let coordinate = ChunkCoordinate::new(0, 0, 0);
        let mut bytes = encode_grid(&VoxelGrid::empty(), &registry);
        bytes.truncate(100);
        store.insert_raw(coordinate, bytes);

        let chunk = claimed(coordinate);
        let task = ChunkGenerationTask::new(chunk.clone(), flat(), Some(store));
        assert_eq!(task.process().unwrap(), TaskOutcome::Regenerated);
        assert_eq!(chunk.get_voxel(LocalPosition::new(5, 0, 5)), Some(Voxel::new(0)));
        assert!(chunk.flags().save_dirty);
    }

    #[test]
    fn rerun_on_populated_chunk_is_an_error() {
        let chunk = claimed(ChunkCoordinate::new(0, 0, 0));
        let task = ChunkGenerationTask::new(chunk.clone(), flat(), None);
        task.process().unwrap();
        chunk.set_voxel(LocalPosition::new(0, 10, 0), Some(Voxel::new(2))).unwrap();

        assert!(matches!(task.process(), Err(GenerationError::AlreadyPopulated(_))));
        // The first result and later edits are untouched.
        assert_eq!(chunk.get_voxel(LocalPosition::new(0, 10, 0)), Some(Voxel::new(2)));
        assert!(!chunk.is_generating());
    }

    struct FailingGenerator;

    impl WorldGenerator for FailingGenerator {
        fn generate(&self, _coordinate: ChunkCoordinate, _grid: &mut VoxelGrid) {
            panic!("terrain source failed");
        }
    }

    #[test]
    fn panicking_generator_releases_the_claim() {
        let chunk = claimed(ChunkCoordinate::new(0, 0, 0));
        let task = ChunkGenerationTask::new(chunk.clone(), Arc::new(FailingGenerator), None);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task.process()));
        assert!(result.is_err());
        assert!(!chunk.is_generating());
        assert!(!chunk.is_generated());
        // The chunk can be claimed again.
        assert!(chunk.mark_generating());
    }
}
