#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The world engine of a block-based game: a sparse, chunked voxel grid that
//! generates missing regions on worker threads, lights them with a
//! dependency-ordered multi-pass algorithm and turns them into face-culled
//! meshes under a per-frame budget.
//!
//! ## Key Modules
//!
//! * `config` - World settings loaded from JSON
//! * `core` - Concurrency primitives used throughout the engine
//! * `engine_state` - The world, its chunks, lighting, meshing, persistence and workers
//! * `error` - Error types
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use voxel_world::{ChunkCoordinate, FlatGenerator, VoxelTypeRegistry, World, WorldConfig};
//!
//! let world = World::new(
//!     WorldConfig { world_height_chunks: 1, ..WorldConfig::default() },
//!     Arc::new(VoxelTypeRegistry::builtin()),
//!     Arc::new(FlatGenerator::new(4, 0)),
//!     None,
//! )
//! .unwrap();
//! world.generate_chunk(ChunkCoordinate::new(0, 0, 0));
//! world.wait_until_idle();
//! world.update();
//! assert!(world.all_chunks_ready());
//! ```

use std::{path::Path, sync::Arc};

use cgmath::{Deg, Point3, Vector3};
use log::info;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::WorldConfig;
pub use engine_state::{
    camera_state::{Camera, Frustum, Projection},
    persistence::{FileWorldStore, MemoryWorldStore, WorldStore},
    rendering::{meshing::MeshData, ChunkRenderer, RenderStats, Vertex},
    voxels::{
        block::{
            block_side::{BlockSide, Rotation},
            block_type::{BlockType, VoxelType, VoxelTypeRegistry},
            Voxel, VoxelTypeId,
        },
        collision::{Aabb, VoxelCollision},
        coordinates::{ChunkCoordinate, LocalPosition, VoxelPosition, CHUNK_DIMENSION},
        generation::{FlatGenerator, PerlinGenerator, WorldGenerator},
        raycast::RaycastHit,
        world::{UpdateReport, World, WorldStats},
    },
    WorldDriver,
};
pub use error::{ConfigError, GenerationError, LightingError, StoreError, WorldError};

/// Initializes the `env_logger` backend, writing to stdout and filtered by `RUST_LOG`.
///
/// Later calls are ignored.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let initialized = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok();
    if initialized {
        info!("Logger initialized");
    }
}

/// Render distance of the demo, in chunks.
const DEMO_RADIUS: i32 = 2;

/// Counts what the demo world asks a backend to do.
#[derive(Default)]
struct CountingRenderer {
    uploaded_vertices: usize,
    draws: usize,
}

impl ChunkRenderer for CountingRenderer {
    fn upload(&mut self, _coordinate: ChunkCoordinate, mesh: &MeshData) {
        self.uploaded_vertices += mesh.vertices.len();
    }

    fn draw(&mut self, _coordinate: ChunkCoordinate) {
        self.draws += 1;
    }

    fn release(&mut self, _coordinate: ChunkCoordinate) {}
}

/// Generates, lights and meshes a small Perlin world, then saves it under `world/`.
///
/// # Arguments
/// * `config_path` - Optional JSON config; defaults are used without one
pub fn run(config_path: Option<&Path>) -> Result<(), WorldError> {
    let config = match config_path {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    let registry = Arc::new(VoxelTypeRegistry::builtin());
    let store: Arc<dyn WorldStore> = Arc::new(FileWorldStore::open("world", registry.clone())?);
    let world = World::new(
        WorldConfig {
            mesh_builds_per_frame: -1,
            mesh_uploads_per_frame: -1,
            ..config
        },
        registry,
        Arc::new(PerlinGenerator::new(fastrand::u32(..))),
        Some(store),
    )?;

    let spawn = Point3::new(8.0, 100.0, 8.0);
    let enqueued = world.generate_chunks_around(spawn, DEMO_RADIUS);
    info!("Preparing spawn area: {} chunks", enqueued);
    world.wait_until_idle();

    let mut ticks = 0;
    while !world.all_chunks_ready() && ticks < 1000 {
        world.update();
        ticks += 1;
    }
    let stats = world.stats();
    info!(
        "{} of {} chunks ready after {} ticks, {} lighting fallbacks",
        stats.ready, stats.loaded, ticks, stats.lighting_fallbacks
    );

    let camera = Camera::new(spawn, Deg(45.0), Deg(-30.0));
    let projection = Projection::new(1280, 720, Deg(70.0), 0.1, 500.0);
    let mut renderer = CountingRenderer::default();
    let render_stats = world.render(&Frustum::from_camera(&camera, &projection), &mut renderer);
    info!(
        "Drew {} chunks ({} culled), {} vertices uploaded",
        renderer.draws, render_stats.culled, renderer.uploaded_vertices
    );

    if let Some(hit) = world.pick(spawn, Vector3::new(0.0, -1.0, 0.0), 128.0) {
        info!(
            "Ground below spawn at {} ({:?} face), light {}",
            hit.voxel,
            hit.face,
            world.get_light_level(hit.adjacent())
        );
    }

    let written = world.flush()?;
    info!("Saved {} chunks", written);
    Ok(())
}
