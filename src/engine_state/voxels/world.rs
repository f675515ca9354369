//! # World Module
//!
//! This module provides the `World` façade which owns every loaded chunk and
//! coordinates their generation, lighting, meshing and persistence.
//!
//! ## Architecture
//!
//! The world is stored sparsely: only chunks that were requested are kept in
//! the `ChunkGrid`. Chunk y coordinates run from 0 to the configured height;
//! above that is open sky and below it is ungenerated space.
//!
//! ## Per-tick flow
//!
//! `update` is called once per tick by a single driver:
//! 1. Unsaved chunks are handed to the store's write queue.
//! 2. Lighting runs for every dirty chunk, topmost chunks first.
//! 3. Meshes are rebuilt for lit chunks, within the per-frame budget.
//!
//! `render` then uploads and draws meshes through a `ChunkRenderer`.
//!
//! ## Neighbor access
//!
//! Lighting and meshing see neighboring chunks through `WorldSampler`, which
//! takes short read locks on the neighbors. The chunk being processed is locked
//! for writing by the caller and is never sampled.

use std::{
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cgmath::{Point3, Vector3};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::{
    config::WorldConfig,
    engine_state::{
        camera_state::Frustum,
        lighting::{LightingPipeline, LightingSettings, LightingStatus},
        persistence::WorldStore,
        rendering::{
            meshing::{FrameBudget, MeshBuilder},
            ChunkRenderer, RenderStats,
        },
        task_management::{task::Task, GenerationScheduler},
    },
    error::WorldError,
};

use super::{
    block::{block_side::BlockSide, block_type::VoxelTypeRegistry, Voxel},
    chunk::{Chunk, ChunkData},
    chunk_grid::ChunkGrid,
    collision::{find_collision, Aabb, VoxelCollision, VoxelOccupancy},
    coordinates::{ChunkCoordinate, VoxelPosition},
    generation::WorldGenerator,
    raycast::{march, RaycastHit},
    sampler::{ChunkAvailability, NeighborSample, VoxelSampler},
    tasks::chunk_generation_task::ChunkGenerationTask,
};

/// What one `World::update` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Chunks handed to the store.
    pub saved: usize,
    /// Chunks whose lighting completed.
    pub lit: usize,
    /// Chunks whose lighting is waiting or still in progress.
    pub lighting_pending: usize,
    /// Chunks whose lighting fell back to darkness after not converging.
    pub lighting_fallbacks: usize,
    /// Meshes rebuilt.
    pub meshes_built: usize,
    /// Dirty meshes left for a later tick because the frame budget ran out.
    pub meshes_deferred: usize,
}

/// A snapshot of the world's chunk counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks in the grid.
    pub loaded: usize,
    /// Chunks that are generated, lit and displayable.
    pub ready: usize,
    /// Generation tasks queued or running.
    pub pending_generation: usize,
    /// Writes waiting in the store's queue.
    pub pending_writes: usize,
    /// Chunks whose lighting fell back to darkness since the world was created.
    pub lighting_fallbacks: usize,
}

/// Read-only neighbor access backed by the chunk grid.
pub struct WorldSampler<'a> {
    grid: &'a ChunkGrid,
    settings: &'a LightingSettings,
}

impl<'a> WorldSampler<'a> {
    /// Creates a sampler over `grid`.
    pub fn new(grid: &'a ChunkGrid, settings: &'a LightingSettings) -> Self {
        WorldSampler { grid, settings }
    }

    fn chunk_availability(data: &ChunkData) -> ChunkAvailability {
        if data.is_generated() {
            ChunkAvailability::Generated {
                local_lit: data.is_local_lit(),
                lit: data.is_lit(),
                stalled: data.lighting.stalled_invocations() > 0,
            }
        } else if data.flags.generating {
            ChunkAvailability::Pending
        } else {
            ChunkAvailability::Unloaded
        }
    }
}

impl VoxelSampler for WorldSampler<'_> {
    fn availability(&self, coordinate: ChunkCoordinate) -> ChunkAvailability {
        if coordinate.y > self.settings.top_chunk_y {
            return ChunkAvailability::AboveWorld;
        }
        match self.grid.get(coordinate) {
            Some(chunk) => Self::chunk_availability(&chunk.data().get()),
            None => ChunkAvailability::Unloaded,
        }
    }

    fn sample(&self, position: VoxelPosition) -> NeighborSample {
        let coordinate = position.chunk();
        if coordinate.y > self.settings.top_chunk_y {
            return NeighborSample::sky(self.settings.sky_light_level);
        }
        let Some(chunk) = self.grid.get(coordinate) else {
            return NeighborSample::unloaded();
        };
        let data = chunk.data().get();
        let availability = Self::chunk_availability(&data);
        match (&data.voxels, availability) {
            (Some(voxels), _) => {
                let local = position.local();
                let index = local.index();
                NeighborSample {
                    availability,
                    type_id: voxels.get(local).map(|v| v.type_id),
                    sun: data.light.sun(index),
                    block: data.light.block(index),
                }
            }
            (None, ChunkAvailability::Pending) => NeighborSample::pending(),
            (None, _) => NeighborSample::unloaded(),
        }
    }
}

/// The voxel world.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use voxel_world::{
///     FlatGenerator, VoxelPosition, VoxelTypeRegistry, World, WorldConfig,
/// };
///
/// let registry = Arc::new(VoxelTypeRegistry::builtin());
/// let world = World::new(
///     WorldConfig::default(),
///     registry,
///     Arc::new(FlatGenerator::new(3, 0)),
///     None,
/// )
/// .unwrap();
///
/// world.generate_chunk_blocking(voxel_world::ChunkCoordinate::new(0, 0, 0)).unwrap();
/// assert!(world.get_voxel(VoxelPosition::new(0, 2, 0)).is_some());
/// assert!(world.get_voxel(VoxelPosition::new(0, 3, 0)).is_none());
/// ```
pub struct World {
    config: WorldConfig,
    registry: Arc<VoxelTypeRegistry>,
    grid: ChunkGrid,
    scheduler: GenerationScheduler,
    pipeline: LightingPipeline,
    mesh_builder: MeshBuilder,
    /// Mesh rebuilds per `update` tick.
    mesh_budget: FrameBudget,
    /// Mesh uploads per `render` call.
    upload_budget: FrameBudget,
    generator: Arc<dyn WorldGenerator>,
    store: Option<Arc<dyn WorldStore>>,
    /// Advanced by every `update`; all budgets key their quota on it.
    frame: AtomicU64,
    /// Serializes `update` so only one thread runs lighting at a time.
    update_lock: Mutex<()>,
    /// Evicted chunks whose uploaded meshes the renderer must release.
    released: Mutex<Vec<ChunkCoordinate>>,
    lighting_fallbacks: AtomicUsize,
}

impl World {
    /// Creates an empty world and starts its generation workers.
    ///
    /// # Arguments
    /// * `config` - World settings; validated before use
    /// * `registry` - The voxel types of this world
    /// * `generator` - Terrain source for chunks the store does not hold
    /// * `store` - Optional persistence
    pub fn new(
        config: WorldConfig,
        registry: Arc<VoxelTypeRegistry>,
        generator: Arc<dyn WorldGenerator>,
        store: Option<Arc<dyn WorldStore>>,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let settings = LightingSettings::from_config(&config);
        info!(
            "Creating world: {} chunk layers, sky light {}, store {}",
            config.world_height_chunks,
            config.sky_light_level,
            if store.is_some() { "attached" } else { "none" }
        );

        Ok(World {
            scheduler: GenerationScheduler::new(config.resolved_worker_threads()),
            pipeline: LightingPipeline::new(settings),
            mesh_builder: MeshBuilder::new(registry.clone()),
            mesh_budget: FrameBudget::new(config.mesh_builds_per_frame),
            upload_budget: FrameBudget::new(config.mesh_uploads_per_frame),
            grid: ChunkGrid::new(),
            frame: AtomicU64::new(0),
            update_lock: Mutex::new(()),
            released: Mutex::new(Vec::new()),
            lighting_fallbacks: AtomicUsize::new(0),
            config,
            registry,
            generator,
            store,
        })
    }

    /// The world's configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The world's voxel types.
    pub fn registry(&self) -> &Arc<VoxelTypeRegistry> {
        &self.registry
    }

    /// The attached store, if any.
    pub fn store(&self) -> Option<&Arc<dyn WorldStore>> {
        self.store.as_ref()
    }

    /// The chunk at `coordinate`, if loaded.
    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<Chunk> {
        self.grid.get(coordinate)
    }

    /// Coordinates of every loaded chunk.
    pub fn loaded_chunks(&self) -> Vec<ChunkCoordinate> {
        self.grid.keys()
    }

    fn sampler(&self) -> WorldSampler<'_> {
        WorldSampler::new(&self.grid, self.pipeline.settings())
    }

    fn in_world(&self, coordinate: ChunkCoordinate) -> bool {
        (0..=self.config.top_chunk_y()).contains(&coordinate.y)
    }

    /// The voxel at `position`.
    ///
    /// # Returns
    /// `None` for air and for positions whose chunk is not generated.
    pub fn get_voxel(&self, position: VoxelPosition) -> Option<Voxel> {
        self.grid.get(position.chunk())?.get_voxel(position.local())
    }

    /// Resolved light level at `position`.
    ///
    /// Open sky above the world has full sky light; unloaded space is dark.
    pub fn get_light_level(&self, position: VoxelPosition) -> u8 {
        let coordinate = position.chunk();
        if coordinate.y > self.config.top_chunk_y() {
            return self.config.sky_light_level;
        }
        self.grid
            .get(coordinate)
            .map(|chunk| chunk.get_light_level(position.local()))
            .unwrap_or(0)
    }

    /// Replaces the voxel at `position`.
    ///
    /// The owning chunk's lighting, mesh and save state are re-dirtied. Chunks
    /// below it are relit since their sunlight comes through it, and border
    /// edits also refresh the neighbor on the other side of the border.
    ///
    /// # Returns
    /// The previous voxel, or an error if the position is outside the world,
    /// the type is unknown, or the chunk is not generated.
    pub fn set_voxel(
        &self,
        position: VoxelPosition,
        voxel: Option<Voxel>,
    ) -> Result<Option<Voxel>, WorldError> {
        let coordinate = position.chunk();
        if !self.in_world(coordinate) {
            return Err(WorldError::OutOfWorld { y: position.y });
        }
        if let Some(voxel) = &voxel {
            if !self.registry.contains(voxel.type_id) {
                return Err(WorldError::UnknownVoxelType(voxel.type_id));
            }
        }

        let chunk = self
            .grid
            .get(coordinate)
            .ok_or(WorldError::ChunkNotGenerated(coordinate))?;
        let local = position.local();
        let previous = chunk.set_voxel(local, voxel)?;

        for y in 0..coordinate.y {
            if let Some(below) = self.grid.get(ChunkCoordinate::new(coordinate.x, y, coordinate.z)) {
                below.invalidate_lighting();
            }
        }
        for side in BlockSide::all() {
            if local.step(side).is_some() {
                continue;
            }
            if let Some(neighbor) = self.grid.get(coordinate.neighbor(side)) {
                match side {
                    BlockSide::TOP | BlockSide::BOTTOM => neighbor.mark_mesh_dirty(),
                    _ => neighbor.invalidate_lighting(),
                }
            }
        }
        Ok(previous)
    }

    /// Queues generation of the chunk at `coordinate`.
    ///
    /// # Returns
    /// `true` if a task was enqueued; `false` if the chunk is outside the
    /// world, already generated, or already being generated.
    pub fn generate_chunk(&self, coordinate: ChunkCoordinate) -> bool {
        if !self.in_world(coordinate) {
            return false;
        }
        let Some(chunk) = self.claim(coordinate) else {
            return false;
        };
        self.scheduler.enqueue(Box::new(ChunkGenerationTask::new(
            chunk,
            self.generator.clone(),
            self.store.clone(),
        )));
        true
    }

    /// Generates the chunk at `coordinate` on the calling thread.
    ///
    /// Returns immediately if the chunk is already generated, and waits for an
    /// in-flight generation task to finish.
    pub fn generate_chunk_blocking(&self, coordinate: ChunkCoordinate) -> Result<(), WorldError> {
        if !self.in_world(coordinate) {
            return Err(WorldError::OutOfWorld {
                y: coordinate.origin().y,
            });
        }
        if let Some(chunk) = self.claim(coordinate) {
            ChunkGenerationTask::new(chunk, self.generator.clone(), self.store.clone())
                .process()?;
            return Ok(());
        }
        let Some(chunk) = self.grid.get(coordinate) else {
            return Err(WorldError::ChunkNotGenerated(coordinate));
        };
        while chunk.is_generating() {
            thread::sleep(Duration::from_millis(1));
        }
        if chunk.is_generated() {
            Ok(())
        } else {
            Err(WorldError::ChunkNotGenerated(coordinate))
        }
    }

    /// Claims the chunk at `coordinate` for generation, creating it if missing.
    ///
    /// A claim that lands on an instance `cleanup` evicted in the meantime is
    /// released and retried on the current one.
    fn claim(&self, coordinate: ChunkCoordinate) -> Option<Chunk> {
        loop {
            let (chunk, _) = self.grid.get_or_create(coordinate);
            if !chunk.mark_generating() {
                return None;
            }
            if self.grid.holds(&chunk) {
                return Some(chunk);
            }
            chunk.abort_generation();
        }
    }

    /// Queues generation of every chunk column within `radius` chunks of `center`.
    ///
    /// Farther chunks are enqueued first so the LIFO workers pick up the
    /// nearest ones first; within a column the topmost layer comes first.
    ///
    /// # Returns
    /// The number of tasks enqueued.
    pub fn generate_chunks_around(&self, center: Point3<f32>, radius: i32) -> usize {
        let center = ChunkCoordinate::from_world(center);
        let mut columns = Vec::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let column = ChunkCoordinate::new(center.x + dx, 0, center.z + dz);
                let distance = column.horizontal_distance(&ChunkCoordinate::new(center.x, 0, center.z));
                if distance <= radius as f32 {
                    columns.push((distance, column));
                }
            }
        }
        columns.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut enqueued = 0;
        for (_, column) in columns {
            for y in 0..=self.config.top_chunk_y() {
                if self.generate_chunk(ChunkCoordinate::new(column.x, y, column.z)) {
                    enqueued += 1;
                }
            }
        }
        debug!("Enqueued {} chunks around {}", enqueued, center);
        enqueued
    }

    /// Blocks until every generation task has finished.
    pub fn wait_until_idle(&self) {
        self.scheduler.wait_until_idle();
    }

    /// Like `wait_until_idle`, giving up after `timeout`.
    ///
    /// # Returns
    /// `true` if the workers became idle.
    pub fn wait_until_idle_timeout(&self, timeout: Duration) -> bool {
        self.scheduler.wait_until_idle_timeout(timeout)
    }

    /// Evicts every chunk farther than `radius` chunks from all viewers.
    ///
    /// Chunks still being generated are kept until a later call. Unsaved
    /// chunks are handed to the store before they are dropped.
    ///
    /// # Returns
    /// The number of evicted chunks.
    pub fn cleanup(&self, viewers: &[Point3<f32>], radius: f32) -> usize {
        let mut evicted = 0;
        for coordinate in self.grid.chunks_outside(viewers, radius) {
            let Some(chunk) = self.grid.remove_if_idle(coordinate) else {
                continue;
            };
            if let (Some(store), Some(grid)) = (&self.store, chunk.take_unsaved()) {
                store.write_chunk(coordinate, grid);
            }
            if chunk.mesh_slot().get().uploaded {
                self.released.lock().push(coordinate);
            }
            evicted += 1;
        }
        if evicted > 0 {
            debug!("Evicted {} chunks, {} remain", evicted, self.grid.len());
        }
        evicted
    }

    /// Runs one tick of saving, lighting and meshing.
    pub fn update(&self) -> UpdateReport {
        let _guard = self.update_lock.lock();
        let frame = self.frame.fetch_add(1, Ordering::SeqCst) + 1;
        let mut report = UpdateReport {
            saved: self.save_dirty_chunks(),
            ..UpdateReport::default()
        };

        // Top-down, so a column's local passes can finish within one tick.
        let mut chunks = self.grid.chunks();
        chunks.sort_by(|a, b| b.coordinate().y.cmp(&a.coordinate().y));

        for chunk in &chunks {
            if chunk.take_fresh() {
                self.relight_around(chunk.coordinate());
            }
        }

        for chunk in &chunks {
            self.light_chunk(chunk, &mut report);
        }
        for chunk in &chunks {
            if !self.needs_mesh(chunk) {
                continue;
            }
            if !self.mesh_budget.try_acquire(frame) {
                report.meshes_deferred += 1;
                continue;
            }
            if self.build_mesh(chunk) {
                report.meshes_built += 1;
            }
        }
        report
    }

    /// Hands every unsaved chunk to the store.
    fn save_dirty_chunks(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        let mut saved = 0;
        for chunk in self.grid.chunks() {
            if let Some(grid) = chunk.take_unsaved() {
                store.write_chunk(chunk.coordinate(), grid);
                saved += 1;
            }
        }
        saved
    }

    /// Re-dirties the light of every chunk that may have sampled `coordinate`
    /// while it was still unloaded: the face neighbors and the whole column below.
    fn relight_around(&self, coordinate: ChunkCoordinate) {
        for side in BlockSide::all() {
            if let Some(neighbor) = self.grid.get(coordinate.neighbor(side)) {
                neighbor.invalidate_lighting();
            }
        }
        for y in 0..coordinate.y.saturating_sub(1) {
            if let Some(below) = self.grid.get(ChunkCoordinate::new(coordinate.x, y, coordinate.z)) {
                below.invalidate_lighting();
            }
        }
    }

    fn light_chunk(&self, chunk: &Chunk, report: &mut UpdateReport) {
        let coordinate = chunk.coordinate();
        let sampler = self.sampler();
        let mut guard = chunk.data().get_mut();
        let data = &mut *guard;
        if !data.flags.lighting_dirty {
            return;
        }
        let Some(voxels) = data.voxels.as_ref() else {
            return;
        };

        let result = self.pipeline.run(
            coordinate,
            voxels,
            &mut data.light,
            &mut data.lighting,
            &self.registry,
            &sampler,
        );
        match result {
            Ok(LightingStatus::Ready) => {
                data.flags.lighting_dirty = false;
                data.flags.mesh_dirty = true;
                drop(guard);
                report.lit += 1;
                for side in BlockSide::all() {
                    if let Some(neighbor) = self.grid.get(coordinate.neighbor(side)) {
                        neighbor.mark_mesh_dirty();
                    }
                }
            }
            Ok(LightingStatus::Waiting(_)) | Ok(LightingStatus::InProgress(_)) => {
                report.lighting_pending += 1;
            }
            Err(err) => {
                // The failing pass is marked done; the next tick finishes the pipeline.
                warn!("Lighting of chunk {} fell back to darkness: {}", coordinate, err);
                self.lighting_fallbacks.fetch_add(1, Ordering::Relaxed);
                report.lighting_fallbacks += 1;
                report.lighting_pending += 1;
            }
        }
    }

    /// Lit, mesh-dirty, and no loaded face neighbor is still generating or lighting.
    fn needs_mesh(&self, chunk: &Chunk) -> bool {
        let flags = chunk.flags();
        if !flags.generation_done || flags.lighting_dirty || !flags.mesh_dirty {
            return false;
        }
        let sampler = self.sampler();
        BlockSide::all().into_iter().all(|side| {
            !matches!(
                sampler.availability(chunk.coordinate().neighbor(side)),
                ChunkAvailability::Pending | ChunkAvailability::Generated { lit: false, .. }
            )
        })
    }

    fn build_mesh(&self, chunk: &Chunk) -> bool {
        let sampler = self.sampler();
        let mut data = chunk.data().get_mut();
        if data.flags.lighting_dirty || !data.flags.mesh_dirty {
            return false;
        }
        let Some(voxels) = data.voxels.as_ref() else {
            return false;
        };
        let mesh = self
            .mesh_builder
            .build(chunk.coordinate(), voxels, &data.light, &sampler);
        data.flags.mesh_dirty = false;
        chunk.swap_mesh(Arc::new(mesh));
        true
    }

    /// Uploads, draws and releases chunk meshes through `renderer`.
    ///
    /// Only mesh state is touched; voxels and light are left alone.
    pub fn render(&self, frustum: &Frustum, renderer: &mut dyn ChunkRenderer) -> RenderStats {
        let frame = self.frame.load(Ordering::SeqCst);
        let mut stats = RenderStats::default();

        for coordinate in std::mem::take(&mut *self.released.lock()) {
            if !self.grid.contains(coordinate) {
                renderer.release(coordinate);
                stats.released += 1;
            }
        }

        for chunk in self.grid.chunks() {
            let coordinate = chunk.coordinate();
            let mut slot = chunk.mesh_slot().get_mut();
            let Some(mesh) = slot.mesh.clone() else {
                continue;
            };
            if !slot.uploaded {
                if !self.upload_budget.try_acquire(frame) {
                    continue;
                }
                renderer.upload(coordinate, &mesh);
                slot.uploaded = true;
                stats.uploaded += 1;
            }
            if mesh.is_empty() {
                continue;
            }
            if frustum.intersects_aabb(&mesh.bounds) {
                renderer.draw(coordinate);
                stats.drawn += 1;
            } else {
                stats.culled += 1;
            }
        }
        stats
    }

    /// Whether every loaded chunk is generated, lit and has a mesh.
    pub fn all_chunks_ready(&self) -> bool {
        self.grid.chunks().iter().all(Chunk::is_ready)
    }

    /// Hands unsaved chunks to the store and flushes its write queue.
    ///
    /// # Returns
    /// The number of chunks written. Chunks that failed stay queued.
    pub fn flush(&self) -> Result<usize, WorldError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        self.save_dirty_chunks();
        Ok(store.flush()?)
    }

    /// Marches a ray and returns the first voxel it enters.
    ///
    /// # Arguments
    /// * `origin` - Start of the ray
    /// * `direction` - Direction of the ray
    /// * `max_distance` - Farthest sample distance
    /// * `step` - Distance between samples
    pub fn raycast(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        step: f32,
    ) -> Option<RaycastHit> {
        march(origin, direction, max_distance, step, |voxel| {
            self.get_voxel(voxel).is_some()
        })
    }

    /// `raycast` with the configured step.
    pub fn pick(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        self.raycast(origin, direction, max_distance, self.config.raycast_step)
    }

    /// The first collision between `aabb` and colliding voxels.
    ///
    /// Space inside the world whose chunk is not generated, and everything
    /// below the world, collides. Open sky above the world never does.
    pub fn collision_check(&self, aabb: &Aabb) -> Option<VoxelCollision> {
        let top = self.config.top_chunk_y();
        find_collision(aabb, |voxel| {
            let coordinate = voxel.chunk();
            if coordinate.y > top {
                return VoxelOccupancy::Empty;
            }
            let Some(chunk) = self.grid.get(coordinate) else {
                return VoxelOccupancy::Ungenerated;
            };
            let data = chunk.data().get();
            match &data.voxels {
                None => VoxelOccupancy::Ungenerated,
                Some(voxels) => match voxels.get(voxel.local()) {
                    Some(v) if self.registry.collides(v.type_id) => VoxelOccupancy::Solid,
                    _ => VoxelOccupancy::Empty,
                },
            }
        })
    }

    /// Whether `aabb` collides with anything.
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        self.collision_check(aabb).is_some()
    }

    /// Chunk counts and lighting fallbacks.
    pub fn stats(&self) -> WorldStats {
        let chunks = self.grid.chunks();
        WorldStats {
            loaded: chunks.len(),
            ready: chunks.iter().filter(|c| c.is_ready()).count(),
            pending_generation: self.scheduler.pending(),
            pending_writes: self.store.as_ref().map_or(0, |s| s.pending_writes()),
            lighting_fallbacks: self.lighting_fallbacks.load(Ordering::Relaxed),
        }
    }
}
