//! # Block Type Module
//!
//! Voxel types are registered once at startup into an immutable
//! `VoxelTypeRegistry`, which is then shared by reference with the world,
//! the lighting passes, the mesh builder and the stores. The engine only ever
//! asks the registry read-only questions such as "is type T transparent".

use std::collections::HashMap;

use num_derive::FromPrimitive;

use super::{Voxel, VoxelTypeId};
use crate::{engine_state::lighting::MAX_LIGHT_LEVEL, error::ConfigError};

/// Static properties of one voxel type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelType {
    /// Registry id, also the persisted id.
    pub id: VoxelTypeId,
    /// Display name.
    pub name: String,
    /// Light passes through and neighbors' faces stay visible.
    pub transparent: bool,
    /// Takes part in bounding box collision queries.
    pub collides: bool,
    /// Bytes of inventory payload attached to every voxel of this type.
    pub inventory_size: usize,
    /// Block light emitted by the voxel.
    pub light_emission: u8,
    /// Texture atlas index per face, indexed by `BlockSide`.
    pub textures: [u32; 6],
}

impl VoxelType {
    /// An opaque, colliding type using texture 0 on every face.
    pub fn new(id: VoxelTypeId, name: impl Into<String>) -> Self {
        VoxelType {
            id,
            name: name.into(),
            transparent: false,
            collides: true,
            inventory_size: 0,
            light_emission: 0,
            textures: [0; 6],
        }
    }

    /// Marks the type transparent.
    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    /// Excludes the type from collision queries.
    pub fn non_colliding(mut self) -> Self {
        self.collides = false;
        self
    }

    /// Attaches an inventory payload of `size` bytes.
    pub fn with_inventory(mut self, size: usize) -> Self {
        self.inventory_size = size;
        self
    }

    /// Makes the type a light source.
    pub fn emitting(mut self, level: u8) -> Self {
        self.light_emission = level.min(MAX_LIGHT_LEVEL);
        self
    }

    /// Uses `texture` on every face.
    pub fn with_texture(mut self, texture: u32) -> Self {
        self.textures = [texture; 6];
        self
    }

    /// Uses a texture per face, in `BlockSide` order.
    pub fn with_textures(mut self, textures: [u32; 6]) -> Self {
        self.textures = textures;
        self
    }
}

/// Immutable table of voxel types keyed by id.
#[derive(Debug, Default)]
pub struct VoxelTypeRegistry {
    types: HashMap<VoxelTypeId, VoxelType>,
}

impl VoxelTypeRegistry {
    /// Starts building a registry.
    pub fn builder() -> VoxelTypeRegistryBuilder {
        VoxelTypeRegistryBuilder::default()
    }

    /// A registry holding every `BlockType` of the built-in palette.
    pub fn builtin() -> Self {
        let mut builder = Self::builder();
        for block_type in BlockType::all() {
            builder.insert(block_type.voxel_type());
        }
        builder.build()
    }

    /// Looks up a type.
    pub fn get(&self, id: VoxelTypeId) -> Option<&VoxelType> {
        self.types.get(&id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: VoxelTypeId) -> bool {
        self.types.contains_key(&id)
    }

    /// Whether light and visibility pass through the type. Unknown ids count as transparent.
    pub fn is_transparent(&self, id: VoxelTypeId) -> bool {
        self.get(id).map_or(true, |t| t.transparent)
    }

    /// Whether the type takes part in collisions. Unknown ids never collide.
    pub fn collides(&self, id: VoxelTypeId) -> bool {
        self.get(id).is_some_and(|t| t.collides)
    }

    /// Whether voxels of the type carry an inventory payload.
    pub fn has_inventory(&self, id: VoxelTypeId) -> bool {
        self.inventory_size(id) > 0
    }

    /// Inventory payload size of the type, 0 when it has none.
    pub fn inventory_size(&self, id: VoxelTypeId) -> usize {
        self.get(id).map_or(0, |t| t.inventory_size)
    }

    /// Light emitted by the type.
    pub fn light_emission(&self, id: VoxelTypeId) -> u8 {
        self.get(id).map_or(0, |t| t.light_emission)
    }

    /// Creates a voxel of type `id`, with a zeroed inventory when the type has one.
    pub fn instantiate(&self, id: VoxelTypeId) -> Option<Voxel> {
        let voxel_type = self.get(id)?;
        let voxel = Voxel::new(id);
        if voxel_type.inventory_size > 0 {
            Some(voxel.with_inventory(vec![0u8; voxel_type.inventory_size]))
        } else {
            Some(voxel)
        }
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Collects voxel types before freezing them into a registry.
#[derive(Debug, Default)]
pub struct VoxelTypeRegistryBuilder {
    types: HashMap<VoxelTypeId, VoxelType>,
}

impl VoxelTypeRegistryBuilder {
    /// Adds a type, rejecting negative or duplicate ids.
    pub fn register(mut self, voxel_type: VoxelType) -> Result<Self, ConfigError> {
        if voxel_type.id < 0 {
            return Err(ConfigError::Invalid(format!(
                "voxel type id {} is reserved",
                voxel_type.id
            )));
        }
        if self.types.contains_key(&voxel_type.id) {
            return Err(ConfigError::Invalid(format!(
                "voxel type id {} registered twice",
                voxel_type.id
            )));
        }
        self.insert(voxel_type);
        Ok(self)
    }

    fn insert(&mut self, voxel_type: VoxelType) {
        self.types.insert(voxel_type.id, voxel_type);
    }

    /// Freezes the registry.
    pub fn build(self) -> VoxelTypeRegistry {
        VoxelTypeRegistry { types: self.types }
    }
}

/// The built-in palette used by the bundled generators and the demo binary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Bedrock-like base layer.
    STONE = 0,
    /// A basic dirt block, used as a common building material.
    DIRT = 1,
    /// A grass block with different textures on top and sides.
    GRASS = 2,
    /// A wooden block with a bark texture on all sides.
    WOOD = 3,
    /// Transparent glass.
    GLASS = 4,
    /// Opaque light source.
    LAMP = 5,
    /// Container with a small inventory.
    CHEST = 6,
}

impl BlockType {
    /// Every built-in block type.
    pub fn all() -> [BlockType; 7] {
        [
            BlockType::STONE,
            BlockType::DIRT,
            BlockType::GRASS,
            BlockType::WOOD,
            BlockType::GLASS,
            BlockType::LAMP,
            BlockType::CHEST,
        ]
    }

    /// The registry id of the block type.
    pub fn id(self) -> VoxelTypeId {
        self as VoxelTypeId
    }

    /// Converts a registry id back to a built-in block type.
    pub fn from_id(id: VoxelTypeId) -> Option<Self> {
        num_traits::FromPrimitive::from_i16(id)
    }

    /// The registry entry for the block type.
    pub fn voxel_type(self) -> VoxelType {
        let base = VoxelType::new(self.id(), format!("{:?}", self).to_lowercase());
        match self {
            BlockType::STONE => base.with_texture(5),
            BlockType::DIRT => base.with_texture(1),
            // Sides 2, top 3, bottom dirt.
            BlockType::GRASS => base.with_textures([2, 2, 3, 1, 2, 2]),
            BlockType::WOOD => base.with_texture(0),
            BlockType::GLASS => base.transparent().with_texture(6),
            BlockType::LAMP => base.emitting(14).with_texture(7),
            BlockType::CHEST => base.with_inventory(27).with_textures([8, 8, 9, 9, 10, 8]),
        }
    }
}
