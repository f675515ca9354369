//! # Voxel Engine Core
//!
//! This module contains the voxel world itself: voxel values and types, chunks
//! and the grid that owns them, terrain generation, neighbor sampling and the
//! `World` façade with its spatial queries.
//!
//! ## Architecture
//!
//! * **Block**: voxel values, faces, rotations and the type registry
//! * **Chunk**: a 16x16x16 voxel grid plus its light, flags and mesh
//! * **ChunkGrid**: concurrent map from chunk coordinates to chunks
//! * **Generation**: terrain generators and the task that runs them
//! * **World**: get/set, generation and eviction, raycasts and collisions
//!
//! ## Data Flow
//!
//! 1. The world enqueues generation tasks for missing chunks
//! 2. Workers fill chunks from the store or a generator
//! 3. `World::update` lights dirty chunks and rebuilds their meshes
//! 4. `World::render` hands finished meshes to the renderer
//!
//! ## Thread Safety
//!
//! Every chunk guards its voxels, light and flags with one lock, so a voxel
//! edit and the dirty flags it raises are observed together. The grid itself
//! is a sharded concurrent map; a lookup returns either a live chunk handle or
//! nothing.

pub mod block;
pub mod chunk;
pub mod chunk_grid;
pub mod collision;
pub mod coordinates;
pub mod generation;
pub mod raycast;
pub mod sampler;
pub mod tasks;
pub mod world;
