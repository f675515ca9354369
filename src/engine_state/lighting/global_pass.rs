//! # Global Lighting Pass
//!
//! Fills the voxels the local pass left in shadow by repeated relaxation. A
//! sweep visits every shadowed voxel and collects the light levels of its face
//! neighbors that are already known; the voxel then takes the brightest of
//! them minus one, unless it is already at least that bright. All updates of a
//! sweep are applied together, so light advances one voxel per sweep like a
//! breadth-first flood fill, and levels only ever rise.
//!
//! Sweeps repeat until one changes nothing. Whatever is still pending then
//! either waits on a pending voxel in a neighbor chunk (the pass is retried on
//! a later tick) or is sealed off entirely and settles to darkness.
//!
//! A pending voxel across the border only counts as something to wait for
//! while its chunk is still making progress. Once that chunk's own pass has
//! stalled, both sides are waiting on each other's dark voxels: a pocket split
//! by the seam. This side then settles its half to darkness, and the stalled
//! side resolves against those zeros on its next pass.

use log::error;

use crate::{
    engine_state::voxels::{
        block::block_side::BlockSide,
        coordinates::{LocalPosition, CHUNK_SIZE},
        sampler::ChunkAvailability,
    },
    error::LightingError,
};

use super::{light_map::UNRESOLVED, LightingPass, PassContext, PassKind, PassStatus};

/// Lateral light relaxation into shadowed voxels.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalLightingPass;

/// Outcome of one sweep over the pending voxels.
struct Sweep {
    updates: Vec<(usize, i8)>,
    waits_on_neighbor: bool,
}

impl GlobalLightingPass {
    /// Every face neighbor must be absent for good or have finished its local pass.
    fn neighbors_ready(ctx: &PassContext<'_>) -> bool {
        BlockSide::all().into_iter().all(|side| {
            matches!(
                ctx.sampler.availability(ctx.coordinate.neighbor(side)),
                ChunkAvailability::AboveWorld
                    | ChunkAvailability::Unloaded
                    | ChunkAvailability::Generated { local_lit: true, .. }
            )
        })
    }

    /// Whether the voxel at `index` takes its block light from its neighbors.
    fn is_shadowed(ctx: &PassContext<'_>, index: usize, chunk_sky: i8) -> bool {
        match ctx.voxels.get_index(index) {
            Some(voxel) => {
                ctx.registry.is_transparent(voxel.type_id)
                    && ctx.registry.light_emission(voxel.type_id) == 0
                    && ctx.light.sun(index) < chunk_sky
            }
            None => ctx.light.sun(index) < chunk_sky,
        }
    }

    fn sweep(ctx: &PassContext<'_>) -> Sweep {
        let chunk_sky = ctx.settings.chunk_sky_level(ctx.coordinate.y);
        let mut sweep = Sweep {
            updates: Vec::new(),
            waits_on_neighbor: false,
        };

        for index in 0..CHUNK_SIZE {
            if !Self::is_shadowed(ctx, index, chunk_sky) {
                continue;
            }
            let pending = ctx.light.is_pending(index);
            let local = LocalPosition::from_index(index);
            let mut brightest: Option<i8> = None;
            let mut waits = false;
            let mut offer = |level: i8| {
                brightest = Some(brightest.map_or(level, |b| b.max(level)));
            };

            for side in BlockSide::all() {
                match local.step(side) {
                    Some(neighbor) => {
                        let n = neighbor.index();
                        if ctx.light.is_pending(n) {
                            continue;
                        }
                        let opaque = ctx
                            .voxels
                            .get_index(n)
                            .is_some_and(|v| !ctx.registry.is_transparent(v.type_id));
                        if opaque {
                            let block = ctx.light.block(n);
                            if block > 0 {
                                offer(block);
                            }
                        } else {
                            offer(ctx.light.level(n) as i8);
                        }
                    }
                    None => {
                        let position = ctx.coordinate.voxel(local).offset(side);
                        let sample = ctx.sampler.sample(position);
                        match sample.availability {
                            ChunkAvailability::AboveWorld | ChunkAvailability::Unloaded => {
                                offer(sample.level() as i8)
                            }
                            ChunkAvailability::Pending => waits = true,
                            ChunkAvailability::Generated { stalled, .. } => {
                                let opaque = sample
                                    .type_id
                                    .is_some_and(|id| !ctx.registry.is_transparent(id));
                                if sample.block == UNRESOLVED {
                                    waits |= !stalled;
                                } else if opaque {
                                    if sample.block > 0 {
                                        offer(sample.block);
                                    }
                                } else {
                                    offer(sample.level() as i8);
                                }
                            }
                        }
                    }
                }
            }

            if pending && waits {
                sweep.waits_on_neighbor = true;
            }
            if let Some(level) = brightest {
                let level = (level - 1).max(0);
                if level > ctx.light.block(index) {
                    sweep.updates.push((index, level));
                }
            }
        }
        sweep
    }

    /// Settles every pending voxel to darkness and returns how many there were.
    fn settle_to_darkness(ctx: &mut PassContext<'_>) -> usize {
        let mut settled = 0;
        for index in 0..CHUNK_SIZE {
            if ctx.light.is_pending(index) {
                ctx.light.set_block(index, 0);
                settled += 1;
            }
        }
        settled
    }
}

impl LightingPass for GlobalLightingPass {
    fn kind(&self) -> PassKind {
        PassKind::Global
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassStatus, LightingError> {
        if !Self::neighbors_ready(ctx) {
            return Ok(PassStatus::NotReady);
        }

        let mut progressed = false;
        let waits_on_neighbor = loop {
            let sweep = Self::sweep(ctx);
            if sweep.updates.is_empty() {
                break sweep.waits_on_neighbor;
            }
            progressed = true;
            for (index, level) in sweep.updates {
                ctx.light.set_block(index, level);
            }
        };

        if ctx.light.pending_count() == 0 {
            ctx.progress.set_stalled_invocations(0);
            return Ok(PassStatus::Done);
        }

        if !waits_on_neighbor {
            // Nothing can ever reach these voxels.
            Self::settle_to_darkness(ctx);
            ctx.progress.set_stalled_invocations(0);
            return Ok(PassStatus::Done);
        }

        if progressed {
            ctx.progress.set_stalled_invocations(0);
            return Ok(PassStatus::InProgress);
        }

        let stalled = ctx.progress.stalled_invocations() + 1;
        if stalled < ctx.settings.stall_limit {
            ctx.progress.set_stalled_invocations(stalled);
            return Ok(PassStatus::InProgress);
        }

        let unresolved = Self::settle_to_darkness(ctx);
        ctx.progress.set_stalled_invocations(0);
        error!(
            "Lighting of chunk {} stalled for {} invocations, {} voxels defaulted to darkness",
            ctx.coordinate, stalled, unresolved
        );
        Err(LightingError::NonConvergence {
            coordinate: ctx.coordinate,
            unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        lighting::{
            test_support::light_until_settled, LightMap, LightingPipeline, LightingProgress,
            LightingSettings, LightingStatus, LocalLightingPass,
        },
        voxels::{
            block::{
                block_type::{BlockType, VoxelTypeRegistry},
                Voxel,
            },
            chunk::voxel_grid::VoxelGrid,
            coordinates::{ChunkCoordinate, VoxelPosition},
            sampler::{IsolatedSampler, NeighborSample, VoxelSampler},
        },
    };

    const SETTINGS: LightingSettings = LightingSettings {
        sky_light_level: 15,
        top_chunk_y: 0,
        stall_limit: 3,
    };

    fn isolated() -> IsolatedSampler {
        IsolatedSampler {
            top_chunk_y: 0,
            sky_light_level: 15,
        }
    }

    /// A stone roof at y = 12 over x in 0..8, leaving the rest of the chunk open.
    fn half_roofed() -> VoxelGrid {
        VoxelGrid::from_fn(|p| (p.y == 12 && p.x < 8).then(|| Voxel::new(BlockType::STONE.id())))
    }

    #[test]
    fn light_flows_sideways_under_a_roof() {
        let registry = VoxelTypeRegistry::builtin();
        let pipeline = LightingPipeline::new(SETTINGS);
        let voxels = half_roofed();
        let (light, status) = light_until_settled(
            &pipeline,
            ChunkCoordinate::new(0, 0, 0),
            &voxels,
            &registry,
            &isolated(),
        );

        assert_eq!(status, Ok(LightingStatus::Ready));
        assert_eq!(light.pending_count(), 0);
        // Column x = 8 is open sky; each step under the roof loses one level.
        assert_eq!(light.level(LocalPosition::new(8, 5, 5).index()), 15);
        assert_eq!(light.level(LocalPosition::new(7, 5, 5).index()), 14);
        assert_eq!(light.level(LocalPosition::new(0, 5, 5).index()), 7);
    }

    #[test]
    fn converged_chunk_is_a_fixpoint() {
        let registry = VoxelTypeRegistry::builtin();
        let pipeline = LightingPipeline::new(SETTINGS);
        let voxels = half_roofed();
        let coordinate = ChunkCoordinate::new(0, 0, 0);
        let sampler = isolated();
        let (mut light, _) = light_until_settled(&pipeline, coordinate, &voxels, &registry, &sampler);
        let before = light.clone();

        let mut progress = LightingProgress::default();
        let mut ctx = PassContext {
            coordinate,
            voxels: &voxels,
            light: &mut light,
            progress: &mut progress,
            registry: &registry,
            sampler: &sampler,
            settings: &SETTINGS,
        };
        assert_eq!(GlobalLightingPass.run(&mut ctx), Ok(PassStatus::Done));
        assert_eq!(light, before);
    }

    #[test]
    fn sealed_pocket_settles_to_darkness() {
        let registry = VoxelTypeRegistry::builtin();
        let pipeline = LightingPipeline::new(SETTINGS);
        // A hollow stone box around (5, 5, 5).
        let voxels = VoxelGrid::from_fn(|p| {
            let shell = (4..=6).contains(&p.x) && (4..=6).contains(&p.y) && (4..=6).contains(&p.z);
            let hollow = p.x == 5 && p.y == 5 && p.z == 5;
            (shell && !hollow).then(|| Voxel::new(BlockType::STONE.id()))
        });
        let (light, status) = light_until_settled(
            &pipeline,
            ChunkCoordinate::new(0, 0, 0),
            &voxels,
            &registry,
            &isolated(),
        );
        assert_eq!(status, Ok(LightingStatus::Ready));
        assert_eq!(light.level(LocalPosition::new(5, 5, 5).index()), 0);
        assert_eq!(light.pending_count(), 0);
    }

    #[test]
    fn lamp_lights_a_covered_room() {
        let registry = VoxelTypeRegistry::builtin();
        let pipeline = LightingPipeline::new(SETTINGS);
        let mut voxels = VoxelGrid::from_fn(|p| (p.y == 15).then(|| Voxel::new(BlockType::STONE.id())));
        voxels.set(LocalPosition::new(8, 0, 8), Some(Voxel::new(BlockType::LAMP.id())));
        let (light, status) = light_until_settled(
            &pipeline,
            ChunkCoordinate::new(0, 0, 0),
            &voxels,
            &registry,
            &isolated(),
        );
        assert_eq!(status, Ok(LightingStatus::Ready));
        assert_eq!(light.level(LocalPosition::new(8, 1, 8).index()), 13);
        assert_eq!(light.level(LocalPosition::new(8, 3, 8).index()), 11);
    }

    /// Every neighbor chunk is generated and lit locally, but its voxels never resolve.
    struct StuckNeighbors {
        stalled: bool,
    }

    impl VoxelSampler for StuckNeighbors {
        fn availability(&self, coordinate: ChunkCoordinate) -> ChunkAvailability {
            if coordinate.y > 0 {
                ChunkAvailability::AboveWorld
            } else {
                ChunkAvailability::Generated {
                    local_lit: true,
                    lit: false,
                    stalled: self.stalled,
                }
            }
        }

        fn sample(&self, position: VoxelPosition) -> NeighborSample {
            if position.y >= 16 {
                return NeighborSample::sky(15);
            }
            NeighborSample {
                availability: self.availability(position.chunk()),
                type_id: None,
                sun: 0,
                block: UNRESOLVED,
            }
        }
    }

    #[test]
    fn stalled_pass_falls_back_and_reports() {
        let registry = VoxelTypeRegistry::builtin();
        // Roof everything so only the chunk's side borders remain.
        let voxels = VoxelGrid::from_fn(|p| (p.y == 15).then(|| Voxel::new(BlockType::STONE.id())));
        let sampler = StuckNeighbors { stalled: false };
        let coordinate = ChunkCoordinate::new(0, 0, 0);

        let mut light = LightMap::new();
        let mut progress = LightingProgress::default();
        let mut ctx = PassContext {
            coordinate,
            voxels: &voxels,
            light: &mut light,
            progress: &mut progress,
            registry: &registry,
            sampler: &sampler,
            settings: &SETTINGS,
        };
        assert_eq!(LocalLightingPass.run(&mut ctx), Ok(PassStatus::Done));

        let mut outcomes = Vec::new();
        for _ in 0..SETTINGS.stall_limit {
            outcomes.push(GlobalLightingPass.run(&mut ctx));
        }
        assert_eq!(outcomes[0], Ok(PassStatus::InProgress));
        assert_eq!(outcomes[1], Ok(PassStatus::InProgress));
        assert!(matches!(
            outcomes[2],
            Err(LightingError::NonConvergence { unresolved, .. }) if unresolved == 16 * 16 * 15
        ));
        assert_eq!(light.pending_count(), 0);
        assert_eq!(light.level(0), 0);
    }

    #[test]
    fn pocket_shared_with_a_stalled_neighbor_settles_quietly() {
        let registry = VoxelTypeRegistry::builtin();
        let voxels = VoxelGrid::from_fn(|p| (p.y == 15).then(|| Voxel::new(BlockType::STONE.id())));
        let sampler = StuckNeighbors { stalled: true };

        let mut light = LightMap::new();
        let mut progress = LightingProgress::default();
        let mut ctx = PassContext {
            coordinate: ChunkCoordinate::new(0, 0, 0),
            voxels: &voxels,
            light: &mut light,
            progress: &mut progress,
            registry: &registry,
            sampler: &sampler,
            settings: &SETTINGS,
        };
        assert_eq!(LocalLightingPass.run(&mut ctx), Ok(PassStatus::Done));
        assert_eq!(GlobalLightingPass.run(&mut ctx), Ok(PassStatus::Done));
        assert_eq!(progress.stalled_invocations(), 0);
        assert_eq!(light.pending_count(), 0);
        assert_eq!(light.level(LocalPosition::new(0, 3, 0).index()), 0);
    }
}
