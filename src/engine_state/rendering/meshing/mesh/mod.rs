//! Mesh generation primitives for voxel rendering.
//!
//! # Architecture
//! - [`MeshData`]: the vertex and index buffers of one chunk
//! - [`Face`]: a single face of a voxel with its four corners

mod face;
#[allow(clippy::module_inception)]
mod mesh;

pub use face::Face;
pub use mesh::*;
