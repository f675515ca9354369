//! # Block Module
//!
//! This module provides the voxel value type together with its face and
//! rotation helpers and the voxel type registry.

use block_side::Rotation;

pub mod block_side;
pub mod block_type;

/// The integer type used to reference voxel types.
///
/// `-1` is reserved by the persistence format to mark an absent voxel.
pub type VoxelTypeId = i16;

/// A single occupied voxel.
///
/// Absent voxels are modelled as `None` in a chunk's grid; light levels live in
/// the chunk's light map, not on the voxel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voxel {
    /// Reference into the `VoxelTypeRegistry`.
    pub type_id: VoxelTypeId,
    /// Orientation used to remap face textures.
    pub rotation: Rotation,
    /// Opaque inventory payload for types that carry one.
    pub inventory: Option<Box<[u8]>>,
}

impl Voxel {
    /// Creates an unrotated voxel of the given type.
    pub fn new(type_id: VoxelTypeId) -> Self {
        Voxel {
            type_id,
            rotation: Rotation::default(),
            inventory: None,
        }
    }

    /// Returns the voxel turned to `rotation`.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns the voxel carrying `inventory`.
    pub fn with_inventory(mut self, inventory: impl Into<Box<[u8]>>) -> Self {
        self.inventory = Some(inventory.into());
        self
    }
}
