//! # Raycasting
//!
//! Fixed-step ray marching through voxel space. The ray is sampled every
//! `step` units; the first sample landing in an occupied voxel is the hit.
//! Thin features narrower than `step` can be skipped, which is acceptable for
//! picking at the small default step.

use cgmath::{InnerSpace, Point3, Vector3};

use super::{block::block_side::BlockSide, coordinates::VoxelPosition};

/// The result of a successful raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The occupied voxel that was hit.
    pub voxel: VoxelPosition,
    /// The sample point inside the voxel.
    pub point: Point3<f32>,
    /// The face of the voxel closest to the sample point.
    pub face: BlockSide,
    /// Distance from the origin to `point`.
    pub distance: f32,
}

impl RaycastHit {
    /// The empty voxel in front of the hit face, where a placed voxel would go.
    pub fn adjacent(&self) -> VoxelPosition {
        self.voxel.offset(self.face)
    }
}

/// Marches a ray and reports the first voxel for which `occupied` is true.
///
/// # Arguments
/// * `origin` - Start of the ray in world space
/// * `direction` - Direction of the ray; need not be normalized
/// * `max_distance` - Samples beyond this distance are not taken; must be finite
/// * `step` - Distance between samples, must be positive and finite
/// * `occupied` - Whether a voxel stops the ray
///
/// # Returns
/// The hit, or `None` when nothing is found within `max_distance`.
pub fn march(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
    step: f32,
    mut occupied: impl FnMut(VoxelPosition) -> bool,
) -> Option<RaycastHit> {
    if !max_distance.is_finite() || !step.is_finite() || step <= 0.0 {
        return None;
    }
    let length2 = direction.magnitude2();
    if length2 == 0.0 || !length2.is_finite() {
        return None;
    }
    let direction = direction.normalize();

    let mut k = 1u32;
    loop {
        let distance = step * k as f32;
        if distance > max_distance {
            return None;
        }
        let point = origin + direction * distance;
        let voxel = VoxelPosition::from_world(point);
        if occupied(voxel) {
            return Some(RaycastHit {
                voxel,
                point,
                face: nearest_face(voxel, point),
                distance,
            });
        }
        k = k.checked_add(1)?;
    }
}

/// The face whose normal best matches the offset of `point` from the voxel center.
fn nearest_face(voxel: VoxelPosition, point: Point3<f32>) -> BlockSide {
    let offset = point - voxel.center();
    let mut best = BlockSide::TOP;
    let mut best_dot = f32::NEG_INFINITY;
    for side in BlockSide::all() {
        let normal = side.normal();
        let dot = offset.dot(Vector3::new(normal.x as f32, normal.y as f32, normal.z as f32));
        if dot > best_dot {
            best = side;
            best_dot = dot;
        }
    }
    best
}
