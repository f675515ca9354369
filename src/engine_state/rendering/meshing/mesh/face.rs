use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;

/// A single quad face of a voxel.
///
/// A face is defined by four corner points (lower-left, lower-right,
/// upper-right, upper-left) as seen from outside the voxel, so the corners
/// wind counter-clockwise around the face normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Lower-left corner of the face in voxel space
    pub ll: Point3<i32>,
    /// Lower-right corner of the face in voxel space
    pub lr: Point3<i32>,
    /// Upper-right corner of the face in voxel space
    pub ur: Point3<i32>,
    /// Upper-left corner of the face in voxel space
    pub ul: Point3<i32>,
    /// Which side of the voxel this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face of the voxel at `(i, j, k)` on the given side.
    ///
    /// # Arguments
    /// * `i`, `j`, `k` - The coordinates of the voxel in voxel space
    /// * `block_side` - Which side of the voxel this face represents
    pub fn new(i: i32, j: i32, k: i32, block_side: BlockSide) -> Self {
        let p = Point3::new;
        let (ll, lr, ur, ul) = match block_side {
            BlockSide::RIGHT => (
                p(i + 1, j, k + 1),
                p(i + 1, j, k),
                p(i + 1, j + 1, k),
                p(i + 1, j + 1, k + 1),
            ),
            BlockSide::LEFT => (
                p(i, j, k),
                p(i, j, k + 1),
                p(i, j + 1, k + 1),
                p(i, j + 1, k),
            ),
            BlockSide::FRONT => (
                p(i, j, k + 1),
                p(i + 1, j, k + 1),
                p(i + 1, j + 1, k + 1),
                p(i, j + 1, k + 1),
            ),
            BlockSide::BACK => (
                p(i + 1, j, k),
                p(i, j, k),
                p(i, j + 1, k),
                p(i + 1, j + 1, k),
            ),
            BlockSide::TOP => (
                p(i, j + 1, k + 1),
                p(i + 1, j + 1, k + 1),
                p(i + 1, j + 1, k),
                p(i, j + 1, k),
            ),
            BlockSide::BOTTOM => (
                p(i, j, k),
                p(i + 1, j, k),
                p(i + 1, j, k + 1),
                p(i, j, k + 1),
            ),
        };
        Face {
            ll,
            lr,
            ur,
            ul,
            block_side,
        }
    }

    /// The corners in vertex order: lower-left, lower-right, upper-left, upper-right.
    pub fn corners(&self) -> [Point3<i32>; 4] {
        [self.ll, self.lr, self.ul, self.ur]
    }
}
