//! # Terrain Generation
//!
//! The scheduler fills chunks that the store does not know through a
//! `WorldGenerator`. Generators are pure functions of the chunk coordinate:
//! they receive an empty grid and must fill it completely, and they must give
//! the same answer every time for the same coordinate.

use noise::{NoiseFn, Perlin};

use super::{
    block::{block_type::BlockType, Voxel, VoxelTypeId},
    chunk::voxel_grid::VoxelGrid,
    coordinates::{ChunkCoordinate, LocalPosition, CHUNK_DIMENSION},
};

/// Fills newly created chunks with terrain.
pub trait WorldGenerator: Send + Sync {
    /// Fills `grid`, which starts out empty, with the voxels of `coordinate`.
    fn generate(&self, coordinate: ChunkCoordinate, grid: &mut VoxelGrid);
}

/// Solid ground below a fixed height, air above.
#[derive(Debug, Clone, Copy)]
pub struct FlatGenerator {
    /// Voxels with world y strictly below this value are filled.
    pub ground_height: i32,
    /// The type used for the ground.
    pub type_id: VoxelTypeId,
}

impl FlatGenerator {
    /// Ground of `type_id` up to, but not including, world y `ground_height`.
    pub fn new(ground_height: i32, type_id: VoxelTypeId) -> Self {
        FlatGenerator {
            ground_height,
            type_id,
        }
    }
}

impl WorldGenerator for FlatGenerator {
    fn generate(&self, coordinate: ChunkCoordinate, grid: &mut VoxelGrid) {
        for local in LocalPosition::all() {
            if coordinate.voxel(local).y < self.ground_height {
                grid.set(local, Some(Voxel::new(self.type_id)));
            }
        }
    }
}

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Ground height where the noise is zero.
pub const PERLIN_BASE_HEIGHT: f64 = 32.0;
/// Height variation for noise values of +-1.
pub const PERLIN_AMPLITUDE: f64 = 16.0;
/// Depth of the dirt layer under the grass.
pub const DIRT_DEPTH: i32 = 3;

/// Rolling hills from a 2D Perlin height map.
///
/// Columns are grass on top, a few voxels of dirt below and stone underneath.
pub struct PerlinGenerator {
    perlin: Perlin,
}

impl PerlinGenerator {
    /// A generator whose terrain is fully determined by `seed`.
    pub fn new(seed: u32) -> Self {
        PerlinGenerator {
            perlin: Perlin::new(seed),
        }
    }

    /// Terrain height of the world column (x, z); voxels below it are solid.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let sample = self.perlin.get(Self::to_perlin_pos(x, z, PERLIN_SCALE_FACTOR));
        (PERLIN_BASE_HEIGHT + sample * PERLIN_AMPLITUDE).round() as i32
    }

    /// Converts world column coordinates to scaled noise-space coordinates.
    fn to_perlin_pos(x: i32, z: i32, scale_factor: f64) -> [f64; 2] {
        [x as f64 * scale_factor, z as f64 * scale_factor]
    }
}

impl WorldGenerator for PerlinGenerator {
    fn generate(&self, coordinate: ChunkCoordinate, grid: &mut VoxelGrid) {
        const DIM: usize = CHUNK_DIMENSION as usize;
        let origin = coordinate.origin();

        for z in 0..DIM {
            for x in 0..DIM {
                let height = self.height_at(origin.x + x as i32, origin.z + z as i32);
                for y in 0..DIM {
                    let world_y = origin.y + y as i32;
                    if world_y >= height {
                        break;
                    }
                    let block = if world_y == height - 1 {
                        BlockType::GRASS
                    } else if world_y >= height - 1 - DIRT_DEPTH {
                        BlockType::DIRT
                    } else {
                        BlockType::STONE
                    };
                    grid.set(LocalPosition::new(x, y, z), Some(Voxel::new(block.id())));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_generator_fills_below_height() {
        let generator = FlatGenerator::new(3, BlockType::STONE.id());
        let mut grid = VoxelGrid::empty();
        generator.generate(ChunkCoordinate::new(0, 0, 0), &mut grid);
        assert_eq!(grid.occupied_count(), 16 * 16 * 3);
        assert!(grid.is_occupied(LocalPosition::new(9, 2, 9)));
        assert!(!grid.is_occupied(LocalPosition::new(9, 3, 9)));

        let mut above = VoxelGrid::empty();
        generator.generate(ChunkCoordinate::new(0, 1, 0), &mut above);
        assert_eq!(above.occupied_count(), 0);
    }

    #[test]
    fn perlin_generator_is_deterministic_and_layered() {
        let a = PerlinGenerator::new(7);
        let b = PerlinGenerator::new(7);
        let coordinate = ChunkCoordinate::new(2, 1, -3);
        let mut first = VoxelGrid::empty();
        let mut second = VoxelGrid::empty();
        a.generate(coordinate, &mut first);
        b.generate(coordinate, &mut second);
        assert_eq!(first, second);

        // Heights stay within the configured band, so chunk layer 1 (y 16..32)
        // always holds some ground and chunk layer 4 (y 64..80) never does.
        let mut low = VoxelGrid::empty();
        a.generate(ChunkCoordinate::new(0, 1, 0), &mut low);
        assert!(low.occupied_count() > 0);
        let mut high = VoxelGrid::empty();
        a.generate(ChunkCoordinate::new(0, 4, 0), &mut high);
        assert_eq!(high.occupied_count(), 0);

        let height = a.height_at(5, 5);
        let column_chunk = ChunkCoordinate::new(0, (height - 1).div_euclid(16), 0);
        let mut grid = VoxelGrid::empty();
        a.generate(column_chunk, &mut grid);
        let local = LocalPosition::new(5, (height - 1).rem_euclid(16) as usize, 5);
        assert_eq!(grid.get(local).map(|v| v.type_id), Some(BlockType::GRASS.id()));
    }
}
