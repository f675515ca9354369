//! Vertex data structures for voxel rendering.
//!
//! This module defines the vertex format produced by the mesh builder and
//! handed to the rendering backend.

use cgmath::Point3;

/// A vertex of a chunk mesh.
///
/// The layout is plain old data so a backend can upload a slice of vertices
/// with `bytemuck::cast_slice` without copying.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Light: f32 (4 bytes)
/// - Texture Index: u32 (4 bytes)
///
/// Total size: 28 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in world space
    pub position: [f32; 3],
    /// UV texture coordinates (normalized 0.0-1.0)
    pub tex_coords: [f32; 2],
    /// Light level of the face, normalized to 0.0-1.0
    pub light: f32,
    /// Index of the texture in the texture atlas
    pub texture_index: u32,
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `pos` - The position of the vertex in world space
    /// * `u`, `v` - Texture coordinates
    /// * `light` - Normalized light level of the face
    /// * `texture_index` - Index of the texture in the atlas
    pub fn new(pos: Point3<f32>, u: f32, v: f32, light: f32, texture_index: u32) -> Self {
        Vertex {
            position: [pos.x, pos.y, pos.z],
            tex_coords: [u, v],
            light,
            texture_index,
        }
    }
}
