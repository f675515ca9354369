//! # Chunk Codec
//!
//! The persisted form of a voxel grid. Slots are written in index order, all
//! integers little-endian:
//!
//! ```text
//! absent voxel:  [type_id = -1: i16]
//! present voxel: [type_id: i16][rotation: u8][reserved: i32][inventory: inventory_size bytes]
//! ```
//!
//! The inventory is only present for types whose registry entry declares one,
//! and always has exactly the declared length.

use crate::{
    engine_state::voxels::{
        block::{block_side::Rotation, block_type::VoxelTypeRegistry, Voxel, VoxelTypeId},
        chunk::voxel_grid::{VoxelGrid, VoxelGridBuilder},
        coordinates::{ChunkCoordinate, CHUNK_SIZE},
    },
    error::StoreError,
};

/// Type id written for absent voxels.
pub const ABSENT_TYPE_ID: VoxelTypeId = -1;

/// Serializes `grid` into the persisted layout.
pub fn encode_grid(grid: &VoxelGrid, registry: &VoxelTypeRegistry) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(CHUNK_SIZE * 2);
    for index in 0..CHUNK_SIZE {
        match grid.get_index(index) {
            None => bytes.extend_from_slice(&ABSENT_TYPE_ID.to_le_bytes()),
            Some(voxel) => {
                bytes.extend_from_slice(&voxel.type_id.to_le_bytes());
                bytes.push(voxel.rotation.quadrant());
                bytes.extend_from_slice(&0i32.to_le_bytes());

                let size = registry.inventory_size(voxel.type_id);
                if size > 0 {
                    let inventory = voxel.inventory.as_deref().unwrap_or(&[]);
                    let kept = inventory.len().min(size);
                    bytes.extend_from_slice(&inventory[..kept]);
                    bytes.resize(bytes.len() + (size - kept), 0);
                }
            }
        }
    }
    bytes
}

/// Reads fixed-size fields off the front of a byte slice.
struct Reader<'a> {
    bytes: &'a [u8],
    coordinate: ChunkCoordinate,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], StoreError> {
        if self.bytes.len() < len {
            return Err(self.error("payload is truncated"));
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn read_i16(&mut self) -> Result<i16, StoreError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u8(&mut self) -> Result<u8, StoreError> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32, StoreError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn error(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Decode {
            coordinate: self.coordinate,
            reason: reason.into(),
        }
    }
}

/// Deserializes a grid written by [`encode_grid`].
///
/// # Returns
/// `StoreError::Decode` for truncated or trailing data, unknown types and invalid rotations.
pub fn decode_grid(
    coordinate: ChunkCoordinate,
    bytes: &[u8],
    registry: &VoxelTypeRegistry,
) -> Result<VoxelGrid, StoreError> {
    let mut reader = Reader { bytes, coordinate };
    let mut builder = VoxelGridBuilder::new();

    for _ in 0..CHUNK_SIZE {
        let type_id = reader.read_i16()?;
        if type_id == ABSENT_TYPE_ID {
            builder.push(None);
            continue;
        }
        if !registry.contains(type_id) {
            return Err(reader.error(format!("unknown voxel type {}", type_id)));
        }
        let quadrant = reader.read_u8()?;
        let rotation = Rotation::from_quadrant(quadrant)
            .map_err(|_| reader.error(format!("invalid rotation {}", quadrant)))?;
        let _reserved = reader.read_i32()?;

        let mut voxel = Voxel::new(type_id).with_rotation(rotation);
        let size = registry.inventory_size(type_id);
        if size > 0 {
            voxel = voxel.with_inventory(reader.take(size)?.to_vec());
        }
        builder.push(Some(voxel));
    }

    if !reader.bytes.is_empty() {
        return Err(reader.error(format!("{} trailing bytes", reader.bytes.len())));
    }
    builder
        .finish()
        .map_err(|count| reader.error(format!("decoded {} of {} voxels", count, CHUNK_SIZE)))
}
