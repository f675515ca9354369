//! # Voxel Grid Module
//!
//! A chunk's fully allocated voxel array. Besides the `Option<Voxel>` slots the
//! grid keeps an occupancy bit vector, so occupancy checks and iteration over
//! occupied voxels never have to touch the voxel payloads.
//!
//! `VoxelGridBuilder` fills a grid slot by slot in index order and refuses to
//! finish a partial grid, which is how decoders uphold the rule that a chunk is
//! either entirely ungenerated or entirely allocated.

use bitvec::vec::BitVec;

use crate::engine_state::voxels::{
    block::Voxel,
    coordinates::{LocalPosition, CHUNK_SIZE},
};

use super::chunk_iteration::OccupiedVoxels;

/// The voxel slots of one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    /// One slot per voxel in `LocalPosition::index` order.
    voxels: Vec<Option<Voxel>>,
    /// Bit `i` is set when slot `i` holds a voxel.
    occupancy: BitVec,
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl VoxelGrid {
    /// A grid where every slot is absent.
    pub fn empty() -> Self {
        VoxelGrid {
            voxels: vec![None; CHUNK_SIZE],
            occupancy: BitVec::repeat(false, CHUNK_SIZE),
        }
    }

    /// A grid filled by calling `f` for every local position.
    pub fn from_fn(mut f: impl FnMut(LocalPosition) -> Option<Voxel>) -> Self {
        let mut builder = VoxelGridBuilder::new();
        for local in LocalPosition::all() {
            builder.push(f(local));
        }
        // A builder fed CHUNK_SIZE slots is always complete.
        builder.finish().unwrap_or_default()
    }

    /// The voxel at `local`, if present.
    pub fn get(&self, local: LocalPosition) -> Option<&Voxel> {
        self.voxels[local.index()].as_ref()
    }

    /// The voxel at a linear index, if present.
    pub fn get_index(&self, index: usize) -> Option<&Voxel> {
        self.voxels[index].as_ref()
    }

    /// Replaces the slot at `local`, returning the previous content.
    pub fn set(&mut self, local: LocalPosition, voxel: Option<Voxel>) -> Option<Voxel> {
        let index = local.index();
        self.occupancy.set(index, voxel.is_some());
        std::mem::replace(&mut self.voxels[index], voxel)
    }

    /// Whether the slot at `local` holds a voxel.
    pub fn is_occupied(&self, local: LocalPosition) -> bool {
        self.occupancy[local.index()]
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.occupancy.count_ones()
    }

    /// Iterates every occupied slot with its position.
    pub fn occupied(&self) -> OccupiedVoxels<'_> {
        OccupiedVoxels::new(self)
    }

    pub(super) fn occupancy(&self) -> &BitVec {
        &self.occupancy
    }

    pub(super) fn slots(&self) -> &[Option<Voxel>] {
        &self.voxels
    }
}

/// Builds a `VoxelGrid` slot by slot in index order.
pub struct VoxelGridBuilder {
    voxels: Vec<Option<Voxel>>,
    occupancy: BitVec,
}

impl Default for VoxelGridBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelGridBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        VoxelGridBuilder {
            voxels: Vec::with_capacity(CHUNK_SIZE),
            occupancy: BitVec::with_capacity(CHUNK_SIZE),
        }
    }

    /// Appends the next slot.
    pub fn push(&mut self, voxel: Option<Voxel>) {
        self.occupancy.push(voxel.is_some());
        self.voxels.push(voxel);
    }

    /// Number of slots pushed so far.
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Whether nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Finishes the grid, or hands back the slot count when it is not exactly one chunk.
    pub fn finish(self) -> Result<VoxelGrid, usize> {
        if self.voxels.len() != CHUNK_SIZE {
            return Err(self.voxels.len());
        }
        Ok(VoxelGrid {
            voxels: self.voxels,
            occupancy: self.occupancy,
        })
    }
}
