//! # Camera State Management
//!
//! This module handles the camera used by `World::render` to cull chunks:
//! - `Camera`: the viewer's position and orientation
//! - `Projection`: the perspective projection
//! - `Frustum`: clip planes extracted from the combined view-projection matrix

pub mod camera;

pub use camera::{Camera, Frustum, Projection};
