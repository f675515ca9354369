//! # Local Lighting Pass
//!
//! Scans every (x, z) column of a chunk from the top down. Sunlight enters a
//! column from the chunk above (or from the sky for the top chunk layer) and
//! stops at the first opaque voxel. Voxels that end up darker than an open
//! column would be are marked pending for the global pass.

use crate::engine_state::voxels::{
    coordinates::{LocalPosition, CHUNK_DIMENSION},
    sampler::ChunkAvailability,
};

use super::{light_map::UNRESOLVED, LightingPass, PassContext, PassKind, PassStatus};
use crate::error::LightingError;

/// Top-down sunlight propagation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalLightingPass;

impl LocalLightingPass {
    /// Sun level entering each column through the top face, or `None` when the
    /// chunk above has not finished its own local pass.
    fn incoming_light(ctx: &PassContext<'_>) -> Option<Vec<i8>> {
        const DIM: usize = CHUNK_DIMENSION as usize;
        let chunk_sky = ctx.settings.chunk_sky_level(ctx.coordinate.y);

        if ctx.coordinate.y >= ctx.settings.top_chunk_y {
            return Some(vec![chunk_sky; DIM * DIM]);
        }

        let above = ctx.coordinate.above();
        match ctx.sampler.availability(above) {
            // Nothing loaded above: no artificial shadow.
            ChunkAvailability::AboveWorld | ChunkAvailability::Unloaded => {
                Some(vec![chunk_sky; DIM * DIM])
            }
            ChunkAvailability::Pending
            | ChunkAvailability::Generated {
                local_lit: false, ..
            } => None,
            ChunkAvailability::Generated { local_lit: true, .. } => {
                let mut incoming = Vec::with_capacity(DIM * DIM);
                for z in 0..DIM {
                    for x in 0..DIM {
                        let position = above.voxel(LocalPosition::new(x, 0, z));
                        let sample = ctx.sampler.sample(position);
                        let opaque = sample
                            .type_id
                            .is_some_and(|id| !ctx.registry.is_transparent(id));
                        incoming.push(if opaque { 0 } else { (sample.sun - 1).max(0) });
                    }
                }
                Some(incoming)
            }
        }
    }
}

impl LightingPass for LocalLightingPass {
    fn kind(&self) -> PassKind {
        PassKind::Local
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassStatus, LightingError> {
        const DIM: usize = CHUNK_DIMENSION as usize;

        let Some(incoming) = Self::incoming_light(ctx) else {
            return Ok(PassStatus::NotReady);
        };
        let chunk_sky = ctx.settings.chunk_sky_level(ctx.coordinate.y);

        ctx.light.clear();
        for z in 0..DIM {
            for x in 0..DIM {
                let mut sun = incoming[z * DIM + x];
                for y in (0..DIM).rev() {
                    let index = LocalPosition::new(x, y, z).index();
                    let voxel = ctx.voxels.get_index(index);
                    let emission = voxel
                        .map_or(0, |v| ctx.registry.light_emission(v.type_id)) as i8;
                    let opaque = voxel.is_some_and(|v| !ctx.registry.is_transparent(v.type_id));

                    if opaque {
                        sun = 0;
                        ctx.light.set_sun(index, 0);
                        ctx.light.set_block(index, emission);
                        continue;
                    }

                    ctx.light.set_sun(index, sun);
                    let block = if emission > 0 {
                        emission
                    } else if sun < chunk_sky {
                        UNRESOLVED
                    } else {
                        0
                    };
                    ctx.light.set_block(index, block);
                }
            }
        }
        Ok(PassStatus::Done)
    }
}
