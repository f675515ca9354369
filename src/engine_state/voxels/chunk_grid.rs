//! # Chunk Grid
//!
//! The concurrent map from chunk coordinates to chunk handles. The grid is the
//! sole owner of chunks: a chunk lives until it is removed here, and removal is
//! what hands its mesh back to the renderer for release.
//!
//! Lookups clone the `Chunk` handle out of the map, so callers never hold a map
//! guard while they lock a chunk. A lookup racing an eviction returns either
//! the live handle or a miss; the chunk's memory stays valid for as long as any
//! handle to it exists.

use cgmath::Point3;
use dashmap::DashMap;

use super::{chunk::Chunk, coordinates::ChunkCoordinate};

/// A sparse, concurrent grid of chunks.
#[derive(Debug, Default)]
pub struct ChunkGrid {
    chunks: DashMap<ChunkCoordinate, Chunk>,
}

impl ChunkGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `chunk`, returning the chunk it displaced.
    pub fn put(&self, coordinate: ChunkCoordinate, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(coordinate, chunk)
    }

    /// The chunk at `coordinate`.
    pub fn get(&self, coordinate: ChunkCoordinate) -> Option<Chunk> {
        self.chunks.get(&coordinate).map(|entry| entry.value().clone())
    }

    /// The chunk at `coordinate`, inserting an empty one if missing.
    ///
    /// # Returns
    /// The chunk and whether it was created by this call.
    pub fn get_or_create(&self, coordinate: ChunkCoordinate) -> (Chunk, bool) {
        let mut created = false;
        let chunk = self
            .chunks
            .entry(coordinate)
            .or_insert_with(|| {
                created = true;
                Chunk::new(coordinate)
            })
            .value()
            .clone();
        (chunk, created)
    }

    /// Whether a chunk is stored at `coordinate`.
    pub fn contains(&self, coordinate: ChunkCoordinate) -> bool {
        self.chunks.contains_key(&coordinate)
    }

    /// Removes and returns the chunk at `coordinate`.
    pub fn remove(&self, coordinate: ChunkCoordinate) -> Option<Chunk> {
        self.chunks.remove(&coordinate).map(|(_, chunk)| chunk)
    }

    /// Removes the chunk at `coordinate` unless a generation task owns it.
    ///
    /// The ownership check and the removal happen under the map's entry lock,
    /// so a claim made through this grid cannot slip in between. A chunk whose
    /// data lock is busy is kept as well.
    pub fn remove_if_idle(&self, coordinate: ChunkCoordinate) -> Option<Chunk> {
        self.chunks
            .remove_if(&coordinate, |_, chunk| chunk.is_idle())
            .map(|(_, chunk)| chunk)
    }

    /// Whether `chunk` is the instance currently stored at its coordinate.
    pub fn holds(&self, chunk: &Chunk) -> bool {
        self.chunks
            .get(&chunk.coordinate())
            .map_or(false, |entry| entry.value().same_as(chunk))
    }

    /// Every stored coordinate.
    pub fn keys(&self) -> Vec<ChunkCoordinate> {
        self.chunks.iter().map(|entry| *entry.key()).collect()
    }

    /// Handles to every stored chunk.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Coordinates of every chunk farther than `radius` chunks from all viewers.
    ///
    /// Distance is measured on the x/z plane between chunk coordinates and each
    /// viewer's position converted to chunk-space. A chunk within `radius` of
    /// any single viewer survives. With no viewers every chunk is returned.
    ///
    /// # Arguments
    /// * `viewers` - World-space viewer positions
    /// * `radius` - Keep radius in chunks
    pub fn chunks_outside(&self, viewers: &[Point3<f32>], radius: f32) -> Vec<ChunkCoordinate> {
        let centers: Vec<ChunkCoordinate> =
            viewers.iter().map(|v| ChunkCoordinate::from_world(*v)).collect();
        self.chunks
            .iter()
            .map(|entry| *entry.key())
            .filter(|coordinate| {
                centers
                    .iter()
                    .all(|center| coordinate.horizontal_distance(center) > radius)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_inserts_once() {
        let grid = ChunkGrid::new();
        let c = ChunkCoordinate::new(1, 2, 3);
        let (first, created) = grid.get_or_create(c);
        assert!(created);
        let (second, created) = grid.get_or_create(c);
        assert!(!created);
        assert!(first.data().ptr_eq(second.data()));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn removed_handles_stay_usable() {
        let grid = ChunkGrid::new();
        let c = ChunkCoordinate::new(0, 0, 0);
        grid.put(c, Chunk::new(c));
        let handle = grid.get(c).unwrap();
        assert!(grid.remove(c).is_some());
        assert!(!grid.contains(c));
        assert!(grid.get(c).is_none());
        assert_eq!(handle.coordinate(), c);
        assert!(!handle.is_generated());
    }

    #[test]
    fn chunks_outside_keeps_anything_near_some_viewer() {
        let grid = ChunkGrid::new();
        for x in -5..=5 {
            let c = ChunkCoordinate::new(x, 0, 0);
            grid.put(c, Chunk::new(c));
        }
        // Viewers stand in chunk x = -4 and chunk x = 4.
        let viewers = [Point3::new(-60.0, 10.0, 1.0), Point3::new(70.0, 200.0, 1.0)];
        let mut outside = grid.chunks_outside(&viewers, 1.0);
        outside.sort();
        let xs: Vec<i32> = outside.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![-2, -1, 0, 1, 2]);

        assert_eq!(grid.chunks_outside(&[], 100.0).len(), 11);
    }

    #[test]
    fn remove_if_idle_keeps_claimed_chunks() {
        let grid = ChunkGrid::new();
        let c = ChunkCoordinate::new(0, 0, 0);
        let (chunk, _) = grid.get_or_create(c);
        assert!(chunk.mark_generating());
        assert!(grid.remove_if_idle(c).is_none());
        assert!(grid.holds(&chunk));

        chunk.abort_generation();
        let removed = grid.remove_if_idle(c).unwrap();
        assert!(removed.same_as(&chunk));
        assert!(!grid.holds(&chunk));
        assert!(grid.remove_if_idle(c).is_none());
    }

    #[test]
    fn holds_rejects_replaced_instances() {
        let grid = ChunkGrid::new();
        let c = ChunkCoordinate::new(2, 0, 2);
        let (old, _) = grid.get_or_create(c);
        grid.remove(c);
        let (new, created) = grid.get_or_create(c);
        assert!(created);
        assert!(!grid.holds(&old));
        assert!(grid.holds(&new));
    }
}
