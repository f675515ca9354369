//! # Block Side Module
//!
//! This module defines the six faces of a voxel and the rotation quadrants
//! that remap which texture a rotated voxel shows on each face.

use cgmath::Vector3;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::WorldError;

/// Represents the six faces of a voxel.
///
/// The discriminants index per-face tables such as a voxel type's textures.
/// The order is: [LEFT, RIGHT, TOP, BOTTOM, FRONT, BACK]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum BlockSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The top face (facing positive Y)
    TOP = 2,

    /// The bottom face (facing negative Y)
    BOTTOM = 3,

    /// The front face (facing positive Z)
    FRONT = 4,

    /// The back face (facing negative Z)
    BACK = 5,
}

impl BlockSide {
    /// Returns an array containing all six faces in discriminant order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::FRONT,
            BlockSide::BACK,
        ]
    }

    /// The face's index into per-face tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit normal pointing out of the face.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
        }
    }

    /// The face on the opposite side of the voxel.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
        }
    }
}

use BlockSide::{BACK, BOTTOM, FRONT, LEFT, RIGHT, TOP};

/// For each rotation quadrant, the model face whose texture appears on each world face.
///
/// Indexed as `[rotation][world face]`. Quadrants turn the voxel a quarter turn
/// around the Y axis each, so TOP and BOTTOM are fixed and the four horizontal
/// faces cycle FRONT, RIGHT, BACK, LEFT.
pub static ROTATION_FACE_REMAP: [[BlockSide; 6]; 4] = [
    [LEFT, RIGHT, TOP, BOTTOM, FRONT, BACK],
    [BACK, FRONT, TOP, BOTTOM, LEFT, RIGHT],
    [RIGHT, LEFT, TOP, BOTTOM, BACK, FRONT],
    [FRONT, BACK, TOP, BOTTOM, RIGHT, LEFT],
];

/// A voxel's orientation as one of four quarter turns around the Y axis.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default, FromPrimitive)]
pub enum Rotation {
    /// No rotation.
    #[default]
    NORTH = 0,
    /// One quarter turn.
    EAST = 1,
    /// Half turn.
    SOUTH = 2,
    /// Three quarter turns.
    WEST = 3,
}

impl Rotation {
    /// Decodes a rotation quadrant.
    pub fn from_quadrant(quadrant: u8) -> Result<Self, WorldError> {
        Rotation::from_u8(quadrant).ok_or(WorldError::InvalidRotation(quadrant))
    }

    /// The quadrant number, 0 to 3.
    pub fn quadrant(self) -> u8 {
        self as u8
    }

    /// The model face whose texture a voxel with this rotation shows on `side`.
    pub fn remap(self, side: BlockSide) -> BlockSide {
        ROTATION_FACE_REMAP[self as usize][side.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rotation_is_a_face_permutation() {
        for row in ROTATION_FACE_REMAP.iter() {
            let mut seen = [false; 6];
            for side in row {
                seen[side.index()] = true;
            }
            assert!(seen.iter().all(|s| *s));
            assert_eq!(row[TOP.index()], TOP);
            assert_eq!(row[BOTTOM.index()], BOTTOM);
        }
    }

    #[test]
    fn quarter_turns_compose() {
        for side in BlockSide::all() {
            let twice = Rotation::EAST.remap(Rotation::EAST.remap(side));
            assert_eq!(twice, Rotation::SOUTH.remap(side));
            let thrice = Rotation::EAST.remap(twice);
            assert_eq!(thrice, Rotation::WEST.remap(side));
            assert_eq!(Rotation::EAST.remap(thrice), side);
            assert_eq!(Rotation::SOUTH.remap(side), {
                if side == TOP || side == BOTTOM {
                    side
                } else {
                    side.opposite()
                }
            });
        }
    }

    #[test]
    fn rejects_invalid_quadrants() {
        assert_eq!(Rotation::from_quadrant(3).unwrap(), Rotation::WEST);
        assert!(matches!(
            Rotation::from_quadrant(4),
            Err(WorldError::InvalidRotation(4))
        ));
    }

    #[test]
    fn normals_are_opposite() {
        for side in BlockSide::all() {
            assert_eq!(side.normal(), -side.opposite().normal());
            assert_eq!(BlockSide::from_usize(side.index()), Some(side));
        }
    }
}
