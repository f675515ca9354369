//! # Collision Module
//!
//! Axis-aligned bounding boxes and voxel collision queries.
//!
//! A query enumerates every voxel whose unit cube overlaps the query box.
//! Space that has not been generated yet counts as solid, so an entity never
//! falls through terrain that simply has not arrived.

use cgmath::{InnerSpace, Point3, Vector3};

use super::coordinates::VoxelPosition;

/// An axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f32>,
    /// Maximum corner.
    pub max: Point3<f32>,
}

impl Default for Aabb {
    fn default() -> Self {
        let origin = Point3::new(0.0, 0.0, 0.0);
        Aabb {
            min: origin,
            max: origin,
        }
    }
}

impl Aabb {
    /// Creates a box spanning two corners given in any order.
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Aabb {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a box from its center and half extents.
    pub fn from_center(center: Point3<f32>, half_extents: Vector3<f32>) -> Self {
        Aabb::new(center - half_extents, center + half_extents)
    }

    /// The unit cube of a voxel.
    pub fn unit(voxel: VoxelPosition) -> Self {
        let min = voxel.to_world();
        Aabb {
            min,
            max: min + Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Center of the box.
    pub fn center(&self) -> Point3<f32> {
        self.min + (self.max - self.min) * 0.5
    }

    /// Edge lengths of the box.
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Whether the interiors of the two boxes overlap. Touching faces do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Every voxel whose unit cube could overlap the box.
    pub fn voxels(&self) -> impl Iterator<Item = VoxelPosition> {
        let lo = VoxelPosition::from_world(self.min);
        let hi = Point3::new(
            self.max.x.ceil() as i32 - 1,
            self.max.y.ceil() as i32 - 1,
            self.max.z.ceil() as i32 - 1,
        );
        (lo.z..=hi.z).flat_map(move |z| {
            (lo.y..=hi.y).flat_map(move |y| (lo.x..=hi.x).map(move |x| VoxelPosition::new(x, y, z)))
        })
    }
}

/// What a collision query finds at one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelOccupancy {
    /// Nothing that collides.
    Empty,
    /// A colliding voxel.
    Solid,
    /// The owning chunk has no voxel data yet.
    Ungenerated,
}

/// The first collision found by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelCollision {
    /// Center of the query box.
    pub center: Point3<f32>,
    /// Center of the colliding voxel.
    pub collider: Point3<f32>,
    /// The colliding voxel.
    pub voxel: VoxelPosition,
    /// Axes along which the boxes collide, as `[x, y, z]`.
    pub axes: [bool; 3],
}

impl VoxelCollision {
    /// Whether the collision comes from ungenerated space rather than a voxel.
    pub fn is_fail_safe(&self) -> bool {
        self.axes == [true; 3]
    }
}

/// Runs a collision query, asking `probe` about every overlapped voxel.
///
/// # Arguments
/// * `aabb` - The query box
/// * `probe` - Reports what occupies a voxel
///
/// # Returns
/// The first collision in `Aabb::voxels` order (x varies fastest, z slowest), or `None`.
pub fn find_collision(
    aabb: &Aabb,
    mut probe: impl FnMut(VoxelPosition) -> VoxelOccupancy,
) -> Option<VoxelCollision> {
    let center = aabb.center();
    for voxel in aabb.voxels() {
        if !aabb.intersects(&Aabb::unit(voxel)) {
            continue;
        }
        let axes = match probe(voxel) {
            VoxelOccupancy::Empty => continue,
            VoxelOccupancy::Ungenerated => [true; 3],
            VoxelOccupancy::Solid => dominant_axis(center - voxel.center()),
        };
        return Some(VoxelCollision {
            center,
            collider: voxel.center(),
            voxel,
            axes,
        });
    }
    None
}

/// Flags the axis along which `direction` is largest.
fn dominant_axis(direction: Vector3<f32>) -> [bool; 3] {
    if direction.magnitude2() == 0.0 {
        return [false, true, false];
    }
    let (x, y, z) = (direction.x.abs(), direction.y.abs(), direction.z.abs());
    if y >= x && y >= z {
        [false, true, false]
    } else if x >= z {
        [true, false, false]
    } else {
        [false, false, true]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voxels_cover_the_overlapped_cubes() {
        let aabb = Aabb::new(Point3::new(0.5, 0.0, 0.5), Point3::new(1.5, 1.0, 0.9));
        let voxels: Vec<_> = aabb.voxels().collect();
        assert_eq!(
            voxels,
            vec![VoxelPosition::new(0, 0, 0), VoxelPosition::new(1, 0, 0)]
        );

        let negative = Aabb::from_center(Point3::new(-0.5, -0.5, -0.5), Vector3::new(0.25, 0.25, 0.25));
        assert_eq!(negative.voxels().collect::<Vec<_>>(), vec![VoxelPosition::new(-1, -1, -1)]);
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::unit(VoxelPosition::new(0, 0, 0));
        let b = Aabb::unit(VoxelPosition::new(1, 0, 0));
        assert!(!a.intersects(&b));
        let c = Aabb::from_center(Point3::new(1.0, 0.5, 0.5), Vector3::new(0.1, 0.1, 0.1));
        assert!(a.intersects(&c) && b.intersects(&c));
    }

    #[test]
    fn standing_on_a_voxel_collides_vertically() {
        let feet = Aabb::from_center(Point3::new(0.5, 1.7, 0.5), Vector3::new(0.3, 0.9, 0.3));
        let hit = find_collision(&feet, |v| {
            if v.y == 0 {
                VoxelOccupancy::Solid
            } else {
                VoxelOccupancy::Empty
            }
        })
        .unwrap();
        assert_eq!(hit.voxel, VoxelPosition::new(0, 0, 0));
        assert_eq!(hit.axes, [false, true, false]);
        assert!(!hit.is_fail_safe());
    }

    #[test]
    fn ungenerated_space_is_solid() {
        let aabb = Aabb::from_center(Point3::new(8.0, 8.0, 8.0), Vector3::new(0.4, 0.4, 0.4));
        let hit = find_collision(&aabb, |_| VoxelOccupancy::Ungenerated).unwrap();
        assert!(hit.is_fail_safe());
        assert!(find_collision(&aabb, |_| VoxelOccupancy::Empty).is_none());
    }

    #[test]
    fn scan_runs_along_x_before_z() {
        let aabb = Aabb::new(Point3::new(0.5, 0.2, 0.5), Point3::new(1.5, 0.8, 1.5));
        let order: Vec<_> = aabb.voxels().collect();
        assert_eq!(
            order,
            vec![
                VoxelPosition::new(0, 0, 0),
                VoxelPosition::new(1, 0, 0),
                VoxelPosition::new(0, 0, 1),
                VoxelPosition::new(1, 0, 1),
            ]
        );

        let solid = [VoxelPosition::new(0, 0, 1), VoxelPosition::new(1, 0, 0)];
        let hit = find_collision(&aabb, |v| {
            if solid.contains(&v) {
                VoxelOccupancy::Solid
            } else {
                VoxelOccupancy::Empty
            }
        })
        .unwrap();
        assert_eq!(hit.voxel, VoxelPosition::new(1, 0, 0));
    }
}
