//! # Neighbor Sampling
//!
//! Lighting and meshing a chunk needs read-only access to voxels just across
//! its borders. Instead of giving chunks a handle to the whole world, the world
//! injects a `VoxelSampler` into the lighting pipeline and the mesh builder.
//!
//! A sampler is only ever asked about positions *outside* the chunk being
//! processed; that chunk's own data is already locked by the caller.

use crate::engine_state::lighting::light_map::{combine, UNRESOLVED};

use super::{
    block::VoxelTypeId,
    coordinates::{ChunkCoordinate, VoxelPosition},
};

/// What is known about a chunk coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkAvailability {
    /// Above the world ceiling: open sky, never generated.
    AboveWorld,
    /// No chunk has been loaded at this coordinate.
    Unloaded,
    /// A chunk exists but its voxel data is still being generated.
    Pending,
    /// The chunk holds voxel data.
    Generated {
        /// The local lighting pass has completed.
        local_lit: bool,
        /// Every lighting pass has completed.
        lit: bool,
        /// The last global pass ended without progress while waiting on a
        /// neighbor. Cleared once the chunk makes progress or finishes.
        stalled: bool,
    },
}

/// A voxel sampled from a neighboring chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborSample {
    /// Availability of the chunk that owns the sampled voxel.
    pub availability: ChunkAvailability,
    /// Type of the voxel, `None` when absent.
    pub type_id: Option<VoxelTypeId>,
    /// Sun contribution.
    pub sun: i8,
    /// Block contribution.
    pub block: i8,
}

impl NeighborSample {
    /// Sample for a position above the world ceiling.
    pub fn sky(sky_light_level: u8) -> Self {
        NeighborSample {
            availability: ChunkAvailability::AboveWorld,
            type_id: None,
            sun: sky_light_level as i8,
            block: 0,
        }
    }

    /// Sample for a position in a chunk that was never loaded.
    pub fn unloaded() -> Self {
        NeighborSample {
            availability: ChunkAvailability::Unloaded,
            type_id: None,
            sun: 0,
            block: 0,
        }
    }

    /// Sample for a position in a chunk that is still generating.
    pub fn pending() -> Self {
        NeighborSample {
            availability: ChunkAvailability::Pending,
            type_id: None,
            sun: UNRESOLVED,
            block: UNRESOLVED,
        }
    }

    /// Resolved light level of the sampled voxel.
    pub fn level(&self) -> u8 {
        combine(self.sun, self.block)
    }
}

/// Read-only access to voxels and light across chunk borders.
pub trait VoxelSampler {
    /// Availability of the chunk at `coordinate`.
    fn availability(&self, coordinate: ChunkCoordinate) -> ChunkAvailability;

    /// The voxel and light at `position`.
    fn sample(&self, position: VoxelPosition) -> NeighborSample;
}

/// A sampler for a chunk with no loaded neighbors.
///
/// Everything above `top_chunk_y` is open sky and everything else is unloaded.
#[derive(Debug, Clone, Copy)]
pub struct IsolatedSampler {
    /// The y coordinate of the topmost chunk layer.
    pub top_chunk_y: i32,
    /// Light level of open sky.
    pub sky_light_level: u8,
}

impl VoxelSampler for IsolatedSampler {
    fn availability(&self, coordinate: ChunkCoordinate) -> ChunkAvailability {
        if coordinate.y > self.top_chunk_y {
            ChunkAvailability::AboveWorld
        } else {
            ChunkAvailability::Unloaded
        }
    }

    fn sample(&self, position: VoxelPosition) -> NeighborSample {
        match self.availability(position.chunk()) {
            ChunkAvailability::AboveWorld => NeighborSample::sky(self.sky_light_level),
            _ => NeighborSample::unloaded(),
        }
    }
}
