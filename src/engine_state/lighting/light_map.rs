use crate::engine_state::voxels::coordinates::CHUNK_SIZE;

use super::MAX_LIGHT_LEVEL;

/// Marks a light component that has not been computed yet.
pub const UNRESOLVED: i8 = -1;

/// Per-voxel light of one chunk, split into sun and block contributions.
///
/// Both arrays cover every voxel slot, occupied or not. A sun value of
/// `UNRESOLVED` means the local pass has not visited the voxel; a block value
/// of `UNRESOLVED` marks the voxel as pending for the global pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightMap {
    sun: Box<[i8]>,
    block: Box<[i8]>,
}

impl Default for LightMap {
    fn default() -> Self {
        Self::new()
    }
}

impl LightMap {
    /// A light map where nothing has been computed.
    pub fn new() -> Self {
        LightMap {
            sun: vec![UNRESOLVED; CHUNK_SIZE].into_boxed_slice(),
            block: vec![0; CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Resets every voxel to "not computed".
    pub fn clear(&mut self) {
        self.sun.fill(UNRESOLVED);
        self.block.fill(0);
    }

    /// Sun contribution of voxel `index`.
    pub fn sun(&self, index: usize) -> i8 {
        self.sun[index]
    }

    /// Sets the sun contribution of voxel `index`.
    pub fn set_sun(&mut self, index: usize, level: i8) {
        self.sun[index] = level;
    }

    /// Block contribution of voxel `index`.
    pub fn block(&self, index: usize) -> i8 {
        self.block[index]
    }

    /// Sets the block contribution of voxel `index`.
    pub fn set_block(&mut self, index: usize, level: i8) {
        self.block[index] = level;
    }

    /// Whether voxel `index` still waits for the global pass.
    pub fn is_pending(&self, index: usize) -> bool {
        self.block[index] == UNRESOLVED
    }

    /// Number of voxels waiting for the global pass.
    pub fn pending_count(&self) -> usize {
        self.block.iter().filter(|b| **b == UNRESOLVED).count()
    }

    /// Resolved light level of voxel `index` in `0..=MAX_LIGHT_LEVEL`.
    pub fn level(&self, index: usize) -> u8 {
        combine(self.sun[index], self.block[index])
    }
}

/// Combines a sun and a block contribution into a light level.
pub fn combine(sun: i8, block: i8) -> u8 {
    sun.max(block).clamp(0, MAX_LIGHT_LEVEL as i8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_clamped_max_of_components() {
        assert_eq!(combine(UNRESOLVED, UNRESOLVED), 0);
        assert_eq!(combine(3, 9), 9);
        assert_eq!(combine(12, 2), 12);
        assert_eq!(combine(40, 0), MAX_LIGHT_LEVEL);
    }

    #[test]
    fn clear_resets_everything() {
        let mut map = LightMap::new();
        map.set_sun(4, 15);
        map.set_block(5, UNRESOLVED);
        assert_eq!(map.pending_count(), 1);
        map.clear();
        assert_eq!(map, LightMap::new());
        assert_eq!(map.level(4), 0);
    }
}
