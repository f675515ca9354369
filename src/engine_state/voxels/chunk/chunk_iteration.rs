//! # Chunk Iteration Module
//!
//! This module provides an iterator over the occupied voxels of a grid.
//!
//! The iterator walks the occupancy bit vector and only touches voxel slots
//! whose bit is set, so sparse chunks (mostly air) are cheap to traverse.

use bitvec::slice::IterOnes;

use crate::engine_state::voxels::{block::Voxel, coordinates::LocalPosition};

use super::voxel_grid::VoxelGrid;

/// An iterator over all occupied voxels in a grid, in index order.
pub struct OccupiedVoxels<'a> {
    slots: &'a [Option<Voxel>],
    ones: IterOnes<'a, usize, bitvec::order::Lsb0>,
}

impl<'a> OccupiedVoxels<'a> {
    /// Creates an iterator positioned before the first occupied voxel.
    pub fn new(grid: &'a VoxelGrid) -> Self {
        OccupiedVoxels {
            slots: grid.slots(),
            ones: grid.occupancy().iter_ones(),
        }
    }
}

impl<'a> Iterator for OccupiedVoxels<'a> {
    type Item = (LocalPosition, &'a Voxel);

    fn next(&mut self) -> Option<Self::Item> {
        for index in self.ones.by_ref() {
            if let Some(voxel) = self.slots[index].as_ref() {
                return Some((LocalPosition::from_index(index), voxel));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_only_occupied_slots_in_order() {
        let mut grid = VoxelGrid::empty();
        grid.set(LocalPosition::new(0, 0, 1), Some(Voxel::new(1)));
        grid.set(LocalPosition::new(5, 0, 0), Some(Voxel::new(2)));
        let found: Vec<_> = grid.occupied().map(|(p, v)| (p, v.type_id)).collect();
        assert_eq!(
            found,
            vec![
                (LocalPosition::new(5, 0, 0), 2),
                (LocalPosition::new(0, 0, 1), 1)
            ]
        );
        assert_eq!(VoxelGrid::empty().occupied().count(), 0);
    }
}
