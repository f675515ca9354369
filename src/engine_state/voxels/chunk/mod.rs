//! # Chunk Module
//!
//! This module provides the `Chunk` handle and the state it guards for one
//! 16x16x16 region of the world.
//!
//! ## Locking
//!
//! A chunk holds two independent locks:
//! - `data`: the voxel grid, the light map, the lighting progress and every
//!   dirty flag. Mutating a voxel and re-dirtying the derived state happen
//!   under one write guard, so no reader ever sees fresh voxels with stale flags.
//! - `mesh`: the currently displayable mesh. Swapping it replaces an `Arc`, so
//!   the render thread sees either the old or the new complete mesh.
//!
//! ## Lifecycle
//!
//! ```text
//! Empty -> Generating -> LightingDirty -> MeshDirty -> Ready
//!                              ^                        |
//!                              +------ set_voxel -------+
//! ```
//!
//! `generation_done` never goes back to false. The save flag is orthogonal to
//! the states above.

use std::sync::Arc;

use crate::{
    core::MtResource,
    engine_state::{
        lighting::{LightMap, LightingProgress, PassKind},
        rendering::meshing::mesh::MeshData,
    },
    error::{GenerationError, WorldError},
};

use super::{
    block::Voxel,
    coordinates::{ChunkCoordinate, LocalPosition},
};

use voxel_grid::VoxelGrid;

pub mod chunk_iteration;
pub mod voxel_grid;

/// Derived-state flags of a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkFlags {
    /// A generation task has claimed the chunk and not finished yet.
    pub generating: bool,
    /// Voxel data has been populated. Never reset once set.
    pub generation_done: bool,
    /// Light must be recomputed.
    pub lighting_dirty: bool,
    /// The mesh must be rebuilt.
    pub mesh_dirty: bool,
    /// The persisted copy is stale.
    pub save_dirty: bool,
    /// Voxels arrived since the world last re-dirtied the neighbors' light.
    pub fresh: bool,
}

/// Everything guarded by a chunk's data lock.
#[derive(Debug, Default)]
pub struct ChunkData {
    /// `None` until generated, then a fully allocated grid.
    pub voxels: Option<VoxelGrid>,
    /// Per-voxel light.
    pub light: LightMap,
    /// Which lighting passes have finished.
    pub lighting: LightingProgress,
    /// Dirty flags.
    pub flags: ChunkFlags,
}

impl ChunkData {
    /// Whether voxel data is present.
    pub fn is_generated(&self) -> bool {
        self.voxels.is_some()
    }

    /// Whether the local lighting pass has finished for the current voxels.
    pub fn is_local_lit(&self) -> bool {
        self.is_generated() && self.lighting.is_done(PassKind::Local)
    }

    /// Whether every lighting pass has finished for the current voxels.
    pub fn is_lit(&self) -> bool {
        self.is_generated() && !self.flags.lighting_dirty
    }

    /// Re-dirties everything derived from the voxels.
    fn invalidate(&mut self) {
        self.flags.lighting_dirty = true;
        self.flags.mesh_dirty = true;
        self.flags.save_dirty = true;
        self.lighting.reset();
    }
}

/// Coarse lifecycle state of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// No voxel data and no generation in flight.
    Empty,
    /// A generation task owns the chunk.
    Generating,
    /// Voxels present, light outdated.
    LightingDirty,
    /// Light current, mesh outdated.
    MeshDirty,
    /// Light and mesh current.
    Ready,
}

/// The displayable mesh of a chunk.
#[derive(Debug, Default)]
pub struct MeshSlot {
    /// The latest complete mesh.
    pub mesh: Option<Arc<MeshData>>,
    /// Whether the renderer has received `mesh`.
    pub uploaded: bool,
}

/// A shared handle to one chunk. Cloning clones the handle.
#[derive(Debug, Clone)]
pub struct Chunk {
    coordinate: ChunkCoordinate,
    data: MtResource<ChunkData>,
    mesh: MtResource<MeshSlot>,
}

impl Chunk {
    /// Creates an empty, ungenerated chunk.
    pub fn new(coordinate: ChunkCoordinate) -> Self {
        Chunk {
            coordinate,
            data: MtResource::default(),
            mesh: MtResource::default(),
        }
    }

    /// The chunk's coordinate.
    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }

    /// The lock guarding voxels, light and flags.
    pub fn data(&self) -> &MtResource<ChunkData> {
        &self.data
    }

    /// The lock guarding the displayable mesh.
    pub fn mesh_slot(&self) -> &MtResource<MeshSlot> {
        &self.mesh
    }

    /// Claims the chunk for generation.
    ///
    /// # Returns
    /// `false` if the chunk is already generated or being generated.
    pub fn mark_generating(&self) -> bool {
        let mut data = self.data.get_mut();
        if data.flags.generating || data.flags.generation_done {
            return false;
        }
        data.flags.generating = true;
        true
    }

    /// Installs generated or loaded voxels.
    ///
    /// # Arguments
    /// * `grid` - The complete voxel grid
    /// * `from_store` - Whether the grid was read from the store; generated grids are marked unsaved
    ///
    /// # Returns
    /// `GenerationError::AlreadyPopulated` if the chunk already holds voxels; nothing is overwritten.
    pub fn populate(&self, grid: VoxelGrid, from_store: bool) -> Result<(), GenerationError> {
        let mut data = self.data.get_mut();
        if data.is_generated() {
            data.flags.generating = false;
            return Err(GenerationError::AlreadyPopulated(self.coordinate));
        }
        data.voxels = Some(grid);
        data.light.clear();
        data.lighting.reset();
        data.flags = ChunkFlags {
            generating: false,
            generation_done: true,
            lighting_dirty: true,
            mesh_dirty: true,
            save_dirty: !from_store,
            fresh: true,
        };
        Ok(())
    }

    /// Releases a generation claim without installing data.
    pub fn abort_generation(&self) {
        self.data.get_mut().flags.generating = false;
    }

    /// Whether voxel data is present.
    pub fn is_generated(&self) -> bool {
        self.data.get().is_generated()
    }

    /// Whether a generation task currently owns the chunk.
    pub fn is_generating(&self) -> bool {
        self.data.get().flags.generating
    }

    /// Whether no generation task owns the chunk, without blocking.
    ///
    /// Reports `false` while a writer holds the data lock.
    pub fn is_idle(&self) -> bool {
        self.data
            .try_get()
            .map_or(false, |data| !data.flags.generating)
    }

    /// Clears the fresh flag.
    ///
    /// # Returns
    /// Whether voxels were installed since the previous call.
    pub fn take_fresh(&self) -> bool {
        let mut data = self.data.get_mut();
        std::mem::take(&mut data.flags.fresh)
    }

    /// Whether both handles refer to the same chunk instance.
    pub fn same_as(&self, other: &Chunk) -> bool {
        self.data.ptr_eq(&other.data)
    }

    /// A copy of the chunk's flags.
    pub fn flags(&self) -> ChunkFlags {
        self.data.get().flags
    }

    /// The voxel at `local`, `None` for air or when not generated.
    pub fn get_voxel(&self, local: LocalPosition) -> Option<Voxel> {
        self.data
            .get()
            .voxels
            .as_ref()
            .and_then(|grid| grid.get(local).cloned())
    }

    /// Resolved light level at `local`, 0 when not generated.
    pub fn get_light_level(&self, local: LocalPosition) -> u8 {
        let data = self.data.get();
        if data.is_generated() {
            data.light.level(local.index())
        } else {
            0
        }
    }

    /// Replaces the voxel at `local` and re-dirties lighting, mesh and save state.
    ///
    /// # Returns
    /// The previous content of the slot, or `WorldError::ChunkNotGenerated`.
    pub fn set_voxel(
        &self,
        local: LocalPosition,
        voxel: Option<Voxel>,
    ) -> Result<Option<Voxel>, WorldError> {
        let mut data = self.data.get_mut();
        let grid = data
            .voxels
            .as_mut()
            .ok_or(WorldError::ChunkNotGenerated(self.coordinate))?;
        let previous = grid.set(local, voxel);
        data.invalidate();
        Ok(previous)
    }

    /// Forces the lighting pipeline to start over. No-op for ungenerated chunks.
    pub fn invalidate_lighting(&self) {
        let mut data = self.data.get_mut();
        if data.is_generated() {
            data.flags.lighting_dirty = true;
            data.flags.mesh_dirty = true;
            data.lighting.reset();
        }
    }

    /// Requests a mesh rebuild. No-op for ungenerated chunks.
    pub fn mark_mesh_dirty(&self) {
        let mut data = self.data.get_mut();
        if data.is_generated() {
            data.flags.mesh_dirty = true;
        }
    }

    /// Clears the save flag and returns a copy of the voxels if they were unsaved.
    pub fn take_unsaved(&self) -> Option<VoxelGrid> {
        let mut data = self.data.get_mut();
        if !data.flags.save_dirty {
            return None;
        }
        let grid = data.voxels.clone()?;
        data.flags.save_dirty = false;
        Some(grid)
    }

    /// Marks the voxels unsaved again after a failed hand-off to the store.
    pub fn mark_unsaved(&self) {
        let mut data = self.data.get_mut();
        if data.is_generated() {
            data.flags.save_dirty = true;
        }
    }

    /// Atomically replaces the displayable mesh.
    ///
    /// # Returns
    /// The mesh that was displayed before.
    pub fn swap_mesh(&self, mesh: Arc<MeshData>) -> Option<Arc<MeshData>> {
        let mut slot = self.mesh.get_mut();
        slot.uploaded = false;
        slot.mesh.replace(mesh)
    }

    /// The latest complete mesh.
    pub fn mesh(&self) -> Option<Arc<MeshData>> {
        self.mesh.get().mesh.clone()
    }

    /// Whether a mesh has been built at least once.
    pub fn has_mesh(&self) -> bool {
        self.mesh.get().mesh.is_some()
    }

    /// The chunk's lifecycle state.
    pub fn state(&self) -> ChunkState {
        let flags = self.flags();
        if !flags.generation_done {
            if flags.generating {
                ChunkState::Generating
            } else {
                ChunkState::Empty
            }
        } else if flags.lighting_dirty {
            ChunkState::LightingDirty
        } else if flags.mesh_dirty {
            ChunkState::MeshDirty
        } else {
            ChunkState::Ready
        }
    }

    /// Generated, lit and displayable.
    pub fn is_ready(&self) -> bool {
        let flags = self.flags();
        flags.generation_done && !flags.lighting_dirty && self.has_mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::meshing::mesh::MeshData;

    fn generated(coordinate: ChunkCoordinate) -> Chunk {
        let chunk = Chunk::new(coordinate);
        assert!(chunk.mark_generating());
        chunk
            .populate(VoxelGrid::from_fn(|p| (p.y < 3).then(|| Voxel::new(1))), false)
            .unwrap();
        chunk
    }

    #[test]
    fn lifecycle_runs_through_states() {
        let chunk = Chunk::new(ChunkCoordinate::new(0, 0, 0));
        assert_eq!(chunk.state(), ChunkState::Empty);
        assert!(chunk.mark_generating());
        assert!(!chunk.mark_generating());
        assert_eq!(chunk.state(), ChunkState::Generating);
        chunk.populate(VoxelGrid::empty(), true).unwrap();
        assert_eq!(chunk.state(), ChunkState::LightingDirty);
        assert!(!chunk.flags().save_dirty);

        chunk.data().get_mut().flags.lighting_dirty = false;
        assert_eq!(chunk.state(), ChunkState::MeshDirty);
        chunk.data().get_mut().flags.mesh_dirty = false;
        assert_eq!(chunk.state(), ChunkState::Ready);
        assert!(!chunk.is_ready());
        chunk.swap_mesh(Arc::new(MeshData::default()));
        assert!(chunk.is_ready());
    }

    #[test]
    fn populate_twice_is_rejected() {
        let chunk = generated(ChunkCoordinate::new(1, 0, 0));
        let err = chunk.populate(VoxelGrid::empty(), false).unwrap_err();
        assert!(matches!(err, GenerationError::AlreadyPopulated(c) if c == chunk.coordinate()));
        assert_eq!(chunk.get_voxel(LocalPosition::new(0, 0, 0)), Some(Voxel::new(1)));
    }

    #[test]
    fn set_voxel_dirties_everything() {
        let chunk = generated(ChunkCoordinate::new(0, 0, 0));
        {
            let mut data = chunk.data().get_mut();
            data.flags.lighting_dirty = false;
            data.flags.mesh_dirty = false;
            data.flags.save_dirty = false;
            data.lighting.mark_done(PassKind::Local);
        }
        let previous = chunk
            .set_voxel(LocalPosition::new(0, 4, 0), Some(Voxel::new(3)))
            .unwrap();
        assert_eq!(previous, None);
        assert_eq!(chunk.get_voxel(LocalPosition::new(0, 4, 0)), Some(Voxel::new(3)));
        let flags = chunk.flags();
        assert!(flags.lighting_dirty && flags.mesh_dirty && flags.save_dirty);
        assert!(!chunk.data().get().is_local_lit());
    }

    #[test]
    fn set_voxel_on_empty_chunk_fails() {
        let chunk = Chunk::new(ChunkCoordinate::new(0, 0, 0));
        assert!(matches!(
            chunk.set_voxel(LocalPosition::new(0, 0, 0), None),
            Err(WorldError::ChunkNotGenerated(_))
        ));
        assert_eq!(chunk.get_voxel(LocalPosition::new(0, 0, 0)), None);
    }

    #[test]
    fn take_unsaved_clears_flag() {
        let chunk = generated(ChunkCoordinate::new(0, 0, 0));
        assert!(chunk.take_unsaved().is_some());
        assert!(chunk.take_unsaved().is_none());
        chunk.mark_unsaved();
        assert!(chunk.take_unsaved().is_some());
    }

    #[test]
    fn swap_mesh_returns_previous() {
        let chunk = generated(ChunkCoordinate::new(0, 0, 0));
        let first = Arc::new(MeshData::default());
        assert!(chunk.swap_mesh(first.clone()).is_none());
        let previous = chunk.swap_mesh(Arc::new(MeshData::default())).unwrap();
        assert!(Arc::ptr_eq(&previous, &first));
        assert!(!chunk.mesh_slot().get().uploaded);
    }

    #[test]
    fn populate_marks_chunk_fresh_once() {
        let chunk = generated(ChunkCoordinate::new(0, 0, 0));
        assert!(chunk.take_fresh());
        assert!(!chunk.take_fresh());
        chunk
            .set_voxel(LocalPosition::new(0, 8, 0), Some(Voxel::new(1)))
            .unwrap();
        assert!(!chunk.take_fresh());
    }

    #[test]
    fn idle_check_does_not_block_on_writers() {
        let chunk = Chunk::new(ChunkCoordinate::new(0, 0, 0));
        assert!(chunk.is_idle());
        {
            let _writer = chunk.data().get_mut();
            assert!(!chunk.is_idle());
        }
        assert!(chunk.mark_generating());
        assert!(!chunk.is_idle());
        chunk.abort_generation();
        assert!(chunk.is_idle());
        assert!(chunk.same_as(&chunk.clone()));
        assert!(!chunk.same_as(&Chunk::new(chunk.coordinate())));
    }
}
