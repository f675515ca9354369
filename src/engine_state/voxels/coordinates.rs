//! # Coordinate Spaces
//!
//! Three integer coordinate systems are used by the world:
//!
//! * **Voxel-space** (`VoxelPosition`): one unit is one voxel.
//! * **Chunk-space** (`ChunkCoordinate`): one unit is one chunk, obtained from
//!   voxel-space by floor division with `CHUNK_DIMENSION`.
//! * **Local** (`LocalPosition`): a voxel's offset inside its chunk, always in
//!   `0..CHUNK_DIMENSION` on every axis.
//!
//! World-space floating point positions convert to voxel-space by flooring.

use std::fmt;

use cgmath::{Point3, Vector3};

use super::block::block_side::BlockSide;

/// The dimension (width, height, depth) of a chunk in voxels.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of voxels in a single plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of voxels in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: usize = (CHUNK_PLANE_SIZE * CHUNK_DIMENSION) as usize;

/// Identifies a chunk in chunk-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkCoordinate {
    /// Chunk-space x.
    pub x: i32,
    /// Chunk-space y.
    pub y: i32,
    /// Chunk-space z.
    pub z: i32,
}

impl ChunkCoordinate {
    /// Creates a chunk coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkCoordinate { x, y, z }
    }

    /// The chunk containing a world-space point.
    pub fn from_world(position: Point3<f32>) -> Self {
        VoxelPosition::from_world(position).chunk()
    }

    /// Voxel-space position of this chunk's (0, 0, 0) corner.
    pub fn origin(&self) -> VoxelPosition {
        VoxelPosition::new(
            self.x * CHUNK_DIMENSION,
            self.y * CHUNK_DIMENSION,
            self.z * CHUNK_DIMENSION,
        )
    }

    /// Voxel-space position of a local offset inside this chunk.
    pub fn voxel(&self, local: LocalPosition) -> VoxelPosition {
        let origin = self.origin();
        VoxelPosition::new(
            origin.x + local.x as i32,
            origin.y + local.y as i32,
            origin.z + local.z as i32,
        )
    }

    /// The face-adjacent chunk on `side`.
    pub fn neighbor(&self, side: BlockSide) -> Self {
        let n = side.normal();
        ChunkCoordinate::new(self.x + n.x, self.y + n.y, self.z + n.z)
    }

    /// The chunk directly above.
    pub fn above(&self) -> Self {
        self.neighbor(BlockSide::TOP)
    }

    /// The chunk directly below.
    pub fn below(&self) -> Self {
        self.neighbor(BlockSide::BOTTOM)
    }

    /// Horizontal (x, z) euclidean distance to another chunk coordinate.
    pub fn horizontal_distance(&self, other: &ChunkCoordinate) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dz * dz).sqrt()
    }
}

impl fmt::Display for ChunkCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A voxel position in voxel-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VoxelPosition {
    /// Voxel-space x.
    pub x: i32,
    /// Voxel-space y.
    pub y: i32,
    /// Voxel-space z.
    pub z: i32,
}

impl VoxelPosition {
    /// Creates a voxel position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        VoxelPosition { x, y, z }
    }

    /// The voxel containing a world-space point.
    pub fn from_world(position: Point3<f32>) -> Self {
        VoxelPosition::new(
            position.x.floor() as i32,
            position.y.floor() as i32,
            position.z.floor() as i32,
        )
    }

    /// The chunk owning this voxel.
    pub fn chunk(&self) -> ChunkCoordinate {
        ChunkCoordinate::new(
            self.x.div_euclid(CHUNK_DIMENSION),
            self.y.div_euclid(CHUNK_DIMENSION),
            self.z.div_euclid(CHUNK_DIMENSION),
        )
    }

    /// This voxel's offset inside its chunk.
    pub fn local(&self) -> LocalPosition {
        LocalPosition::new(
            self.x.rem_euclid(CHUNK_DIMENSION) as usize,
            self.y.rem_euclid(CHUNK_DIMENSION) as usize,
            self.z.rem_euclid(CHUNK_DIMENSION) as usize,
        )
    }

    /// The face-adjacent voxel on `side`.
    pub fn offset(&self, side: BlockSide) -> Self {
        let n = side.normal();
        VoxelPosition::new(self.x + n.x, self.y + n.y, self.z + n.z)
    }

    /// World-space position of the voxel's minimum corner.
    pub fn to_world(&self) -> Point3<f32> {
        Point3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// World-space center of the voxel's unit cube.
    pub fn center(&self) -> Point3<f32> {
        self.to_world() + Vector3::new(0.5, 0.5, 0.5)
    }
}

impl From<Point3<i32>> for VoxelPosition {
    fn from(p: Point3<i32>) -> Self {
        VoxelPosition::new(p.x, p.y, p.z)
    }
}

impl fmt::Display for VoxelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// A voxel offset inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LocalPosition {
    /// Local x in `0..CHUNK_DIMENSION`.
    pub x: usize,
    /// Local y in `0..CHUNK_DIMENSION`.
    pub y: usize,
    /// Local z in `0..CHUNK_DIMENSION`.
    pub z: usize,
}

impl LocalPosition {
    /// Creates a local position. Components must be below `CHUNK_DIMENSION`.
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        LocalPosition { x, y, z }
    }

    /// Linear index into a chunk's voxel array: x fastest, then y, then z.
    pub fn index(&self) -> usize {
        const DIM: usize = CHUNK_DIMENSION as usize;
        self.x + DIM * self.y + DIM * DIM * self.z
    }

    /// Inverse of [`LocalPosition::index`].
    pub fn from_index(index: usize) -> Self {
        const DIM: usize = CHUNK_DIMENSION as usize;
        LocalPosition::new(index % DIM, (index / DIM) % DIM, index / (DIM * DIM))
    }

    /// The neighbor on `side` if it stays inside the chunk.
    pub fn step(&self, side: BlockSide) -> Option<LocalPosition> {
        let n = side.normal();
        let x = self.x as i32 + n.x;
        let y = self.y as i32 + n.y;
        let z = self.z as i32 + n.z;
        let range = 0..CHUNK_DIMENSION;
        if range.contains(&x) && range.contains(&y) && range.contains(&z) {
            Some(LocalPosition::new(x as usize, y as usize, z as usize))
        } else {
            None
        }
    }

    /// Iterates every local position in index order.
    pub fn all() -> impl Iterator<Item = LocalPosition> {
        (0..CHUNK_SIZE).map(LocalPosition::from_index)
    }
}
