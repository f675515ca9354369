//! # Error Types
//!
//! Every fallible operation in the crate reports one of the enums below.
//! `WorldError` is what the `World` façade hands back to callers; the more
//! specific enums are produced by the subsystems and convert into it with `?`.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine_state::voxels::{block::VoxelTypeId, coordinates::ChunkCoordinate};

/// Errors surfaced by the world façade.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The chunk owning the requested voxel has no generated data yet.
    #[error("chunk {0} has not been generated")]
    ChunkNotGenerated(ChunkCoordinate),

    /// The position lies above or below the vertical extent of the world.
    #[error("voxel y={y} lies outside the world")]
    OutOfWorld {
        /// World-space voxel y coordinate that was rejected.
        y: i32,
    },

    /// The voxel references a type id that is not registered.
    #[error("voxel type {0} is not registered")]
    UnknownVoxelType(VoxelTypeId),

    /// A rotation outside of the four Y-axis quadrants.
    #[error("rotation {0} is not a valid quadrant")]
    InvalidRotation(u8),

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Lighting failure.
    #[error("lighting error: {0}")]
    Lighting(#[from] LightingError),

    /// Configuration failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Generation failure.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// Errors raised by a `WorldStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file system failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted payload for a chunk could not be decoded.
    #[error("chunk {coordinate} could not be decoded: {reason}")]
    Decode {
        /// Coordinate of the corrupt chunk.
        coordinate: ChunkCoordinate,
        /// Human readable reason.
        reason: String,
    },

    /// LZ4 decompression failed.
    #[error("compression error: {0}")]
    Compression(String),
}

/// Errors raised by the lighting pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightingError {
    /// The global pass stopped making progress and fell back to darkness.
    #[error("lighting of chunk {coordinate} did not converge, {unresolved} voxels defaulted to 0")]
    NonConvergence {
        /// Chunk that failed to converge.
        coordinate: ChunkCoordinate,
        /// Number of voxels that were still pending when the fallback applied.
        unresolved: usize,
    },
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for `WorldConfig`.
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by chunk generation tasks.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The task ran against a chunk that already holds voxel data.
    #[error("chunk {0} is already populated")]
    AlreadyPopulated(ChunkCoordinate),

    /// The store failed in a way the task could not recover from.
    #[error("store error while generating: {0}")]
    Store(#[from] StoreError),
}
