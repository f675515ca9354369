//! Mesh data structures for voxel rendering.
//!
//! A `MeshData` is the flat vertex/index buffer of one chunk, ready to be
//! uploaded by a rendering backend. It is immutable once built; chunks share
//! it through an `Arc` and replace it as a whole.

use cgmath::Point3;

use crate::engine_state::{rendering::Vertex, voxels::collision::Aabb};

use super::face::Face;

/// UV coordinates of a face's corners in vertex order (ll, lr, ul, ur).
const FACE_UVS: [(f32, f32); 4] = [(0.0, 1.0), (1.0, 1.0), (0.0, 0.0), (1.0, 0.0)];

/// Index pattern forming the two triangles of a face.
const FACE_INDICES: [u32; 6] = [0, 1, 3, 0, 3, 2];

/// The complete mesh of one chunk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshData {
    /// Four vertices per emitted face.
    pub vertices: Vec<Vertex>,
    /// Six indices per emitted face.
    pub indices: Vec<u32>,
    /// World-space bounds used for frustum culling.
    pub bounds: Aabb,
}

impl MeshData {
    /// Creates an empty mesh covering `bounds`.
    pub fn new(bounds: Aabb) -> Self {
        MeshData {
            vertices: Vec::new(),
            indices: Vec::new(),
            bounds,
        }
    }

    /// Appends the four vertices and six indices of one face.
    ///
    /// # Arguments
    /// * `face` - The face to add
    /// * `texture_index` - Atlas index shown on the face
    /// * `light` - Normalized light level shared by the face's vertices
    pub fn push_face(&mut self, face: &Face, texture_index: u32, light: f32) {
        let base = self.vertices.len() as u32;
        for (corner, (u, v)) in face.corners().into_iter().zip(FACE_UVS) {
            let position: Point3<f32> = corner.cast().unwrap_or(Point3::new(0.0, 0.0, 0.0));
            self.vertices
                .push(Vertex::new(position, u, v, light, texture_index));
        }
        self.indices.extend(FACE_INDICES.iter().map(|i| base + i));
    }

    /// Number of faces in the mesh.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Whether the mesh has no faces.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;

    #[test]
    fn faces_append_offset_indices() {
        let mut mesh = MeshData::default();
        mesh.push_face(&Face::new(0, 0, 0, BlockSide::TOP), 2, 1.0);
        mesh.push_face(&Face::new(0, 0, 0, BlockSide::BOTTOM), 3, 0.5);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 3, 0, 3, 2, 4, 5, 7, 4, 7, 6]);
        assert_eq!(mesh.vertices[0].position, [0.0, 1.0, 1.0]);
        assert_eq!(mesh.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(mesh.vertices[3].tex_coords, [1.0, 0.0]);
        assert_eq!(mesh.vertices[4].texture_index, 3);
        assert_eq!(mesh.vertices[4].light, 0.5);
    }
}
