//! Mesh generation for voxel rendering.
//!
//! This module handles the conversion of a chunk's voxel data into a flat,
//! GPU-friendly mesh and limits how much of that work happens per frame.
//!
//! # Architecture
//! - `MeshBuilder`: turns a chunk snapshot plus neighbor samples into `MeshData`
//! - `FrameBudget`: a per-frame quota shared by every chunk
//! - `mesh/`: the mesh data structures
//!
//! # Face Culling
//! A face of an occupied voxel is emitted only if the voxel on the other side
//! is absent, of an unknown type, or transparent. Faces on the chunk border
//! look the neighbor up through the injected `VoxelSampler`. Each face takes
//! the light level of the voxel it faces, so a lit neighbor lights the face.

use std::sync::Arc;

use parking_lot::Mutex;

pub mod mesh;

pub use mesh::*;

use crate::engine_state::{
    lighting::{LightMap, MAX_LIGHT_LEVEL},
    voxels::{
        block::{block_side::BlockSide, block_type::VoxelTypeRegistry, VoxelTypeId},
        chunk::voxel_grid::VoxelGrid,
        collision::Aabb,
        coordinates::{ChunkCoordinate, CHUNK_DIMENSION},
        sampler::VoxelSampler,
    },
};

/// Builds chunk meshes with face culling.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    registry: Arc<VoxelTypeRegistry>,
}

impl MeshBuilder {
    /// Creates a mesh builder resolving voxel types through `registry`.
    pub fn new(registry: Arc<VoxelTypeRegistry>) -> Self {
        MeshBuilder { registry }
    }

    /// Builds the mesh of one chunk.
    ///
    /// # Arguments
    /// * `coordinate` - The chunk's coordinate
    /// * `voxels` - The chunk's voxel grid
    /// * `light` - The chunk's resolved light map
    /// * `sampler` - Access to voxels across the chunk's borders
    ///
    /// # Returns
    /// The chunk's mesh in world-space coordinates, bounded by the chunk's extent.
    pub fn build(
        &self,
        coordinate: ChunkCoordinate,
        voxels: &VoxelGrid,
        light: &LightMap,
        sampler: &dyn VoxelSampler,
    ) -> MeshData {
        let origin = coordinate.origin();
        let mut mesh = MeshData::new(Aabb::new(
            origin.to_world(),
            ChunkCoordinate::new(coordinate.x + 1, coordinate.y + 1, coordinate.z + 1)
                .origin()
                .to_world(),
        ));

        for (local, voxel) in voxels.occupied() {
            let Some(voxel_type) = self.registry.get(voxel.type_id) else {
                continue;
            };
            let position = coordinate.voxel(local);

            for side in BlockSide::all() {
                let (neighbor_type, level) = match local.step(side) {
                    Some(inner) => (
                        voxels.get(inner).map(|v| v.type_id),
                        light.level(inner.index()),
                    ),
                    None => {
                        let sample = sampler.sample(position.offset(side));
                        (sample.type_id, sample.level())
                    }
                };
                if !self.is_face_visible(neighbor_type) {
                    continue;
                }

                let face = Face::new(position.x, position.y, position.z, side);
                let texture = voxel_type.textures[voxel.rotation.remap(side).index()];
                mesh.push_face(&face, texture, level as f32 / MAX_LIGHT_LEVEL as f32);
            }
        }

        mesh
    }

    /// Whether a face next to a voxel of `neighbor` type can be seen.
    fn is_face_visible(&self, neighbor: Option<VoxelTypeId>) -> bool {
        match neighbor {
            None => true,
            Some(id) => self.registry.is_transparent(id),
        }
    }
}

/// Side length of a chunk in world units.
pub const CHUNK_EXTENT: f32 = CHUNK_DIMENSION as f32;

/// Limits how many operations may happen per frame.
///
/// All chunks share one budget and compare against a shared frame counter, so
/// they agree on how much of the current frame's quota is left.
#[derive(Debug)]
pub struct FrameBudget {
    /// Operations allowed per frame, negative for unlimited.
    limit: i32,
    /// The frame the counter belongs to and the operations used in it.
    used: Mutex<(u64, i32)>,
}

impl FrameBudget {
    /// Creates a budget of `limit` operations per frame; `-1` means unlimited.
    pub fn new(limit: i32) -> Self {
        FrameBudget {
            limit,
            used: Mutex::new((0, 0)),
        }
    }

    /// The configured limit.
    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Takes one unit of `frame`'s quota.
    ///
    /// # Returns
    /// `true` if the operation may proceed in this frame.
    pub fn try_acquire(&self, frame: u64) -> bool {
        if self.limit < 0 {
            return true;
        }
        let mut used = self.used.lock();
        if used.0 != frame {
            *used = (frame, 0);
        }
        if used.1 < self.limit {
            used.1 += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        block::{block_side::Rotation, block_type::BlockType, Voxel},
        coordinates::LocalPosition,
        sampler::IsolatedSampler,
    };

    fn builder() -> MeshBuilder {
        MeshBuilder::new(Arc::new(VoxelTypeRegistry::builtin()))
    }

    fn lit() -> LightMap {
        let mut light = LightMap::new();
        for index in 0..crate::engine_state::voxels::coordinates::CHUNK_SIZE {
            light.set_sun(index, 15);
            light.set_block(index, 0);
        }
        light
    }

    const SAMPLER: IsolatedSampler = IsolatedSampler {
        top_chunk_y: 0,
        sky_light_level: 15,
    };

    #[test]
    fn lone_voxel_emits_six_faces() {
        let mut grid = VoxelGrid::empty();
        grid.set(LocalPosition::new(4, 4, 4), Some(Voxel::new(BlockType::STONE.id())));
        let mesh = builder().build(ChunkCoordinate::new(0, 0, 0), &grid, &lit(), &SAMPLER);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.vertices.iter().all(|v| v.light == 1.0));
    }

    #[test]
    fn shared_opaque_faces_are_culled() {
        let mut grid = VoxelGrid::empty();
        grid.set(LocalPosition::new(4, 4, 4), Some(Voxel::new(BlockType::STONE.id())));
        grid.set(LocalPosition::new(5, 4, 4), Some(Voxel::new(BlockType::DIRT.id())));
        let mesh = builder().build(ChunkCoordinate::new(0, 0, 0), &grid, &lit(), &SAMPLER);
        assert_eq!(mesh.face_count(), 10);
    }

    #[test]
    fn transparent_neighbors_keep_faces() {
        let mut grid = VoxelGrid::empty();
        grid.set(LocalPosition::new(4, 4, 4), Some(Voxel::new(BlockType::STONE.id())));
        grid.set(LocalPosition::new(5, 4, 4), Some(Voxel::new(BlockType::GLASS.id())));
        let mesh = builder().build(ChunkCoordinate::new(0, 0, 0), &grid, &lit(), &SAMPLER);
        assert_eq!(mesh.face_count(), 12);
    }

    #[test]
    fn border_faces_sample_neighbors() {
        let grid = VoxelGrid::from_fn(|_| Some(Voxel::new(BlockType::STONE.id())));
        let mesh = builder().build(ChunkCoordinate::new(0, 0, 0), &grid, &LightMap::new(), &SAMPLER);
        // Only the outer shell is visible; the top faces see open sky.
        assert_eq!(mesh.face_count(), 6 * 16 * 16);
        let top_faces = mesh
            .vertices
            .chunks(4)
            .filter(|quad| quad.iter().all(|v| v.position[1] == 16.0))
            .count();
        assert_eq!(top_faces, 16 * 16);
        assert!(mesh
            .vertices
            .chunks(4)
            .filter(|quad| quad.iter().all(|v| v.position[1] == 16.0))
            .all(|quad| quad[0].light == 1.0));
        assert_eq!(mesh.bounds.max.x, CHUNK_EXTENT);
    }

    #[test]
    fn rotation_remaps_textures() {
        let registry = VoxelTypeRegistry::builder()
            .register(
                crate::engine_state::voxels::block::block_type::VoxelType::new(0, "crate")
                    .with_textures([10, 11, 12, 13, 14, 15]),
            )
            .unwrap()
            .build();
        let builder = MeshBuilder::new(Arc::new(registry));
        let mut grid = VoxelGrid::empty();
        grid.set(
            LocalPosition::new(1, 1, 1),
            Some(Voxel::new(0).with_rotation(Rotation::EAST)),
        );
        let mesh = builder.build(ChunkCoordinate::new(0, 0, 0), &grid, &lit(), &SAMPLER);
        // Faces come out in BlockSide order; the LEFT face shows the BACK texture.
        assert_eq!(mesh.vertices[0].texture_index, 15);
        // TOP is fixed under rotation.
        assert_eq!(mesh.vertices[8].texture_index, 12);
    }

    #[test]
    fn budget_resets_every_frame() {
        let budget = FrameBudget::new(2);
        assert!(budget.try_acquire(1));
        assert!(budget.try_acquire(1));
        assert!(!budget.try_acquire(1));
        assert!(budget.try_acquire(2));

        let unlimited = FrameBudget::new(-1);
        assert!((0..100).all(|_| unlimited.try_acquire(0)));
    }
}
