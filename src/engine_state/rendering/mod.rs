//! Rendering seam of the voxel engine.
//!
//! The engine does not talk to a GPU itself. It builds meshes on the CPU and
//! hands them to a [`ChunkRenderer`], which owns the backend resources. The
//! world drives the renderer from `World::render`:
//!
//! 1. Newly built meshes are uploaded, limited by the per-frame upload budget.
//! 2. Every uploaded chunk whose bounds intersect the camera frustum is drawn.
//! 3. Meshes of chunks evicted since the last frame are released.

pub mod meshing;
mod vertex;

// Re-export commonly used types
pub use vertex::Vertex;

use self::meshing::MeshData;
use super::voxels::coordinates::ChunkCoordinate;

/// A rendering backend that owns the per-chunk GPU resources.
pub trait ChunkRenderer {
    /// Uploads (or replaces) the mesh of the chunk at `coordinate`.
    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &MeshData);

    /// Issues the draw call for an uploaded chunk.
    fn draw(&mut self, coordinate: ChunkCoordinate);

    /// Frees the resources of an evicted chunk.
    fn release(&mut self, coordinate: ChunkCoordinate);
}

/// What a single `World::render` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Meshes handed to the backend.
    pub uploaded: usize,
    /// Chunks drawn.
    pub drawn: usize,
    /// Uploaded chunks skipped by frustum culling.
    pub culled: usize,
    /// Meshes released for evicted chunks.
    pub released: usize,
}
