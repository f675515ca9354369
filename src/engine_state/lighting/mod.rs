//! # Lighting Pipeline
//!
//! Light is computed per chunk by an ordered list of passes. Each pass is
//! re-entrant: it may report that it cannot run yet (a neighbor chunk it depends
//! on is not ready) or that it is still working, and it is simply invoked again
//! on a later tick. The pipeline remembers which passes have finished and always
//! resumes at the first unfinished one.
//!
//! ## Passes
//!
//! 1. [`LocalLightingPass`]: column-wise sunlight from the top down. Depends on
//!    the chunk above having finished its own local pass.
//! 2. [`GlobalLightingPass`]: relaxes light into shadowed air voxels from their
//!    face neighbors until a fixpoint is reached.
//!
//! ## Light levels
//!
//! Each voxel stores a sun and a block contribution (see [`LightMap`]). The
//! visible level is the larger of the two, clamped to `0..=MAX_LIGHT_LEVEL`.

pub mod global_pass;
pub mod light_map;
pub mod local_pass;

use log::debug;

pub use global_pass::GlobalLightingPass;
pub use light_map::LightMap;
pub use local_pass::LocalLightingPass;

use crate::{
    config::WorldConfig,
    engine_state::voxels::{
        block::block_type::VoxelTypeRegistry, chunk::voxel_grid::VoxelGrid,
        coordinates::ChunkCoordinate, sampler::VoxelSampler,
    },
    error::LightingError,
};

/// The brightest light level.
pub const MAX_LIGHT_LEVEL: u8 = 15;

/// Identifies a lighting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Top-down sunlight.
    Local,
    /// Lateral relaxation.
    Global,
}

impl PassKind {
    fn bit(self) -> u8 {
        match self {
            PassKind::Local => 0b01,
            PassKind::Global => 0b10,
        }
    }
}

/// Result of one pass invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// The pass finished.
    Done,
    /// A dependency is missing; nothing was changed.
    NotReady,
    /// Work was done but the pass has not finished.
    InProgress,
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingStatus {
    /// Every pass has finished.
    Ready,
    /// The given pass is waiting for a neighbor chunk.
    Waiting(PassKind),
    /// The given pass is still converging.
    InProgress(PassKind),
}

/// Per-chunk record of finished passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightingProgress {
    done: u8,
    stalled_invocations: u32,
}

impl LightingProgress {
    /// Whether `kind` has finished since the last reset.
    pub fn is_done(&self, kind: PassKind) -> bool {
        self.done & kind.bit() != 0
    }

    /// Records that `kind` has finished.
    pub fn mark_done(&mut self, kind: PassKind) {
        self.done |= kind.bit();
    }

    /// Forgets all progress.
    pub fn reset(&mut self) {
        self.done = 0;
        self.stalled_invocations = 0;
    }

    /// Consecutive global invocations that made no progress.
    pub fn stalled_invocations(&self) -> u32 {
        self.stalled_invocations
    }

    pub(crate) fn set_stalled_invocations(&mut self, count: u32) {
        self.stalled_invocations = count;
    }
}

/// World-wide lighting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightingSettings {
    /// Light level of open sky.
    pub sky_light_level: u8,
    /// The y coordinate of the topmost chunk layer.
    pub top_chunk_y: i32,
    /// Stalled global invocations tolerated before falling back to darkness.
    pub stall_limit: u32,
}

impl LightingSettings {
    /// Settings derived from a world config.
    pub fn from_config(config: &WorldConfig) -> Self {
        LightingSettings {
            sky_light_level: config.sky_light_level,
            top_chunk_y: config.top_chunk_y(),
            stall_limit: config.lighting_stall_limit,
        }
    }

    /// Sun level of an unobstructed column inside chunk layer `chunk_y`.
    ///
    /// Sunlight loses one level per chunk boundary crossed on its way down.
    pub fn chunk_sky_level(&self, chunk_y: i32) -> i8 {
        let crossed = (self.top_chunk_y - chunk_y).max(0);
        (self.sky_light_level as i32 - crossed).max(0) as i8
    }
}

/// Everything a pass may read or write.
pub struct PassContext<'a> {
    /// The chunk being lit.
    pub coordinate: ChunkCoordinate,
    /// The chunk's voxels.
    pub voxels: &'a VoxelGrid,
    /// The chunk's light map.
    pub light: &'a mut LightMap,
    /// The chunk's pass bookkeeping.
    pub progress: &'a mut LightingProgress,
    /// Voxel type properties.
    pub registry: &'a VoxelTypeRegistry,
    /// Access to neighboring chunks.
    pub sampler: &'a dyn VoxelSampler,
    /// World-wide parameters.
    pub settings: &'a LightingSettings,
}

/// One stage of the lighting pipeline.
pub trait LightingPass: Send + Sync {
    /// Identifies the pass in the chunk's progress record.
    fn kind(&self) -> PassKind;

    /// Runs the pass. Must not mutate anything when returning `NotReady`.
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassStatus, LightingError>;
}

/// Drives the ordered passes for a chunk.
pub struct LightingPipeline {
    passes: Vec<Box<dyn LightingPass>>,
    settings: LightingSettings,
}

impl LightingPipeline {
    /// The standard local then global pipeline.
    pub fn new(settings: LightingSettings) -> Self {
        Self::with_passes(
            settings,
            vec![Box::new(LocalLightingPass), Box::new(GlobalLightingPass)],
        )
    }

    /// A pipeline with a custom pass list.
    pub fn with_passes(settings: LightingSettings, passes: Vec<Box<dyn LightingPass>>) -> Self {
        LightingPipeline { passes, settings }
    }

    /// The pipeline's parameters.
    pub fn settings(&self) -> &LightingSettings {
        &self.settings
    }

    /// Runs unfinished passes in order until one cannot finish.
    ///
    /// A pass that fails with an error has still left the light map in a
    /// consistent state; it is recorded as finished and the error is returned.
    pub fn run(
        &self,
        coordinate: ChunkCoordinate,
        voxels: &VoxelGrid,
        light: &mut LightMap,
        progress: &mut LightingProgress,
        registry: &VoxelTypeRegistry,
        sampler: &dyn VoxelSampler,
    ) -> Result<LightingStatus, LightingError> {
        for pass in &self.passes {
            let kind = pass.kind();
            if progress.is_done(kind) {
                continue;
            }

            let mut ctx = PassContext {
                coordinate,
                voxels,
                light: &mut *light,
                progress: &mut *progress,
                registry,
                sampler,
                settings: &self.settings,
            };

            match pass.run(&mut ctx) {
                Ok(PassStatus::Done) => {
                    debug!("Lighting pass {:?} finished for chunk {}", kind, coordinate);
                    progress.mark_done(kind);
                }
                Ok(PassStatus::NotReady) => return Ok(LightingStatus::Waiting(kind)),
                Ok(PassStatus::InProgress) => return Ok(LightingStatus::InProgress(kind)),
                Err(error) => {
                    progress.mark_done(kind);
                    return Err(error);
                }
            }
        }
        Ok(LightingStatus::Ready)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_level_drops_per_chunk_layer() {
        let settings = LightingSettings {
            sky_light_level: 15,
            top_chunk_y: 7,
            stall_limit: 4,
        };
        assert_eq!(settings.chunk_sky_level(7), 15);
        assert_eq!(settings.chunk_sky_level(5), 13);
        assert_eq!(settings.chunk_sky_level(-20), 0);
        assert_eq!(settings.chunk_sky_level(9), 15);
    }

    #[test]
    fn progress_tracks_passes_independently() {
        let mut progress = LightingProgress::default();
        progress.mark_done(PassKind::Local);
        assert!(progress.is_done(PassKind::Local));
        assert!(!progress.is_done(PassKind::Global));
        progress.set_stalled_invocations(3);
        progress.reset();
        assert!(!progress.is_done(PassKind::Local));
        assert_eq!(progress.stalled_invocations(), 0);
    }

    struct CountingPass {
        kind: PassKind,
        outcome: PassStatus,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl LightingPass for CountingPass {
        fn kind(&self) -> PassKind {
            self.kind
        }

        fn run(&self, _ctx: &mut PassContext<'_>) -> Result<PassStatus, LightingError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.outcome)
        }
    }

    #[test]
    fn pipeline_stops_at_first_unfinished_pass() {
        use crate::engine_state::voxels::sampler::IsolatedSampler;
        use std::sync::atomic::Ordering;
        use std::sync::Arc;

        let settings = LightingSettings {
            sky_light_level: 15,
            top_chunk_y: 0,
            stall_limit: 4,
        };
        let first = Arc::new(CountingPass {
            kind: PassKind::Local,
            outcome: PassStatus::Done,
            calls: Default::default(),
        });
        let second = CountingPass {
            kind: PassKind::Global,
            outcome: PassStatus::NotReady,
            calls: Default::default(),
        };

        struct Shared(Arc<CountingPass>);
        impl LightingPass for Shared {
            fn kind(&self) -> PassKind {
                self.0.kind()
            }
            fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassStatus, LightingError> {
                self.0.run(ctx)
            }
        }

        let pipeline = LightingPipeline::with_passes(
            settings,
            vec![Box::new(Shared(first.clone())), Box::new(second)],
        );
        let registry = VoxelTypeRegistry::builtin();
        let sampler = IsolatedSampler {
            top_chunk_y: 0,
            sky_light_level: 15,
        };
        let voxels = VoxelGrid::empty();
        let mut light = LightMap::new();
        let mut progress = LightingProgress::default();
        let coordinate = ChunkCoordinate::new(0, 0, 0);

        for _ in 0..3 {
            let status = pipeline
                .run(coordinate, &voxels, &mut light, &mut progress, &registry, &sampler)
                .unwrap();
            assert_eq!(status, LightingStatus::Waiting(PassKind::Global));
        }
        // The finished first pass is not re-run.
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    }
}
