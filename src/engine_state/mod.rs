//! # Engine State Module
//!
//! The core engine module that manages the state and functionality of the voxel engine.
//!
//! ## Key Components
//!
//! * `WorldDriver` - Ticks a `World` on a dedicated thread and flushes its store
//! * `camera_state` - Camera, projection and frustum culling
//! * `lighting` - The per-chunk lighting passes
//! * `persistence` - Chunk stores with write-behind queues
//! * `rendering` - Mesh building and the renderer seam
//! * `task_management` - The generation worker pool
//! * `voxels` - Voxel data, chunks and the world façade

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{debug, error, info};
use web_time::{Duration, Instant};

use voxels::world::World;

pub mod camera_state;
pub mod lighting;
pub mod persistence;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Runs `World::update` periodically on its own thread.
///
/// Every `tick_interval_ms` the driver updates the world, and every
/// `save_interval_ms` it flushes the store. Stopping the driver (explicitly or
/// by dropping it) joins the thread and performs a final flush.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use voxel_world::{FlatGenerator, VoxelTypeRegistry, World, WorldConfig, WorldDriver};
///
/// let world = Arc::new(
///     World::new(
///         WorldConfig::default(),
///         Arc::new(VoxelTypeRegistry::builtin()),
///         Arc::new(FlatGenerator::new(40, 0)),
///         None,
///     )
///     .unwrap(),
/// );
/// let mut driver = WorldDriver::start(world.clone());
/// world.generate_chunks_around(cgmath::Point3::new(0.0, 64.0, 0.0), 2);
/// // ... render from the main thread ...
/// driver.stop();
/// ```
pub struct WorldDriver {
    world: Arc<World>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WorldDriver {
    /// Starts ticking `world`.
    pub fn start(world: Arc<World>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let tick = Duration::from_millis(world.config().tick_interval_ms);
        let save_interval = Duration::from_millis(world.config().save_interval_ms);

        let thread_world = world.clone();
        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name("world-driver".to_string())
            .spawn(move || {
                let mut last_flush = Instant::now();
                let mut ticks: u64 = 0;
                while thread_running.load(Ordering::SeqCst) {
                    let report = thread_world.update();
                    ticks += 1;
                    if report.meshes_deferred > 0 {
                        debug!("Tick {}: {} meshes deferred", ticks, report.meshes_deferred);
                    }
                    if last_flush.elapsed() >= save_interval {
                        if let Err(err) = thread_world.flush() {
                            error!("Periodic flush failed: {}", err);
                        }
                        last_flush = Instant::now();
                    }
                    thread::sleep(tick);
                }
                debug!("World driver exiting after {} ticks", ticks);
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("Could not spawn the world driver: {}", err);
                running.store(false, Ordering::SeqCst);
                None
            }
        };
        info!("World driver started, tick {:?}", tick);

        WorldDriver {
            world,
            running,
            handle,
        }
    }

    /// The driven world.
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Whether the driver thread is still ticking.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && self.handle.is_some()
    }

    /// Stops the driver thread and flushes the store once more.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            error!("World driver thread panicked");
        }
        if let Err(err) = self.world.flush() {
            error!("Final flush failed: {}", err);
        }
        info!("World driver stopped");
    }
}

impl Drop for WorldDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
