//! sparse chunk storage, streaming window & tile lookup
//!
//! Chunks are created lazily ahead of the camera and dropped once they fall
//! `CLEANUP_DISTANCE` chunks behind it. Evicted tile buffers go into a small
//! pool and are reused for the next chunk. Every lookup is total: anything
//! outside a generated chunk reads as `Empty`.

use bevy::log::debug;
use std::collections::HashMap;

use crate::constants::*;
use crate::terrain::{chunk_of_pixel, split_tile_x, Chunk, Tile};

/* ===========================================================
   streaming window helpers
   =========================================================== */

/// chunk indices that must exist for this camera position
pub fn generation_window(camera_x: f32) -> std::ops::RangeInclusive<i32> {
    let current = chunk_of_pixel(camera_x);
    (current - 1).max(0)..=current + GENERATION_DISTANCE
}

/// first chunk index that survives eviction
pub fn eviction_threshold(camera_x: f32) -> i32 {
    chunk_of_pixel(camera_x) - CLEANUP_DISTANCE
}

/* ===========================================================
   visible-chunk cache
   =========================================================== */
#[derive(Default, Debug)]
struct VisibleChunks {
    last_camera_x: Option<f32>,
    chunks: Vec<i32>,
}

/* ===========================================================
   store
   =========================================================== */
#[derive(Default)]
pub struct ChunkStore {
    chunks: HashMap<i32, Chunk>,
    free_buffers: Vec<Vec<Tile>>,
    visible: VisibleChunks,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every missing chunk of the generation window, left to right.
    /// `build` receives the chunk index and a recycled tile buffer.
    pub fn ensure_generated<F>(&mut self, camera_x: f32, mut build: F) -> usize
    where
        F: FnMut(i32, Vec<Tile>) -> Chunk,
    {
        let mut built = 0;
        for index in generation_window(camera_x) {
            if self.chunks.contains_key(&index) {
                continue;
            }
            let buffer = self.free_buffers.pop().unwrap_or_default();
            self.chunks.insert(index, build(index, buffer));
            built += 1;
        }
        built
    }

    /// Drop chunks left of `eviction_threshold(camera_x)`.
    pub fn evict_behind(&mut self, camera_x: f32) -> usize {
        let threshold = eviction_threshold(camera_x);
        let stale: Vec<i32> = self
            .chunks
            .keys()
            .copied()
            .filter(|&index| index < threshold)
            .collect();

        for index in &stale {
            if let Some(chunk) = self.chunks.remove(index) {
                self.free_buffers.push(chunk.into_tiles());
            }
        }
        if !stale.is_empty() {
            self.visible.chunks.retain(|index| *index >= threshold);
            debug!("evicted {} chunk(s) behind chunk {}", stale.len(), threshold);
        }
        stale.len()
    }

    /* -------------------------------------------------------
       tile access
       ------------------------------------------------------- */
    pub fn tile_at(&self, tx: i32, ty: i32) -> Tile {
        let (index, lx) = split_tile_x(tx);
        self.chunks
            .get(&index)
            .map_or(Tile::Empty, |chunk| chunk.get(lx, ty))
    }

    /// `false` when the chunk is not generated or `ty` is off the grid.
    pub fn set_tile(&mut self, tx: i32, ty: i32, tile: Tile) -> bool {
        let (index, lx) = split_tile_x(tx);
        self.chunks
            .get_mut(&index)
            .is_some_and(|chunk| chunk.set(lx, ty, tile))
    }

    pub fn chunk(&self, index: i32) -> Option<&Chunk> {
        self.chunks.get(&index)
    }

    pub fn contains(&self, index: i32) -> bool {
        self.chunks.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// loaded chunk indices, ascending
    pub fn indices(&self) -> Vec<i32> {
        let mut indices: Vec<i32> = self.chunks.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /* -------------------------------------------------------
       visibility cache
       ------------------------------------------------------- */

    /// Recompute the chunks overlapping the view, but only once the camera
    /// has moved at least one tile since the last recompute.
    pub fn update_visible(&mut self, camera_x: f32) -> bool {
        if let Some(last) = self.visible.last_camera_x {
            if (camera_x - last).abs() < TILE_SIZE {
                return false;
            }
        }

        let half = VIEW_WIDTH * 0.5;
        let first = chunk_of_pixel(camera_x - half);
        let last = chunk_of_pixel(camera_x + half);

        self.visible.chunks.clear();
        self.visible
            .chunks
            .extend((first..=last).filter(|index| self.chunks.contains_key(index)));
        self.visible.last_camera_x = Some(camera_x);
        true
    }

    pub fn visible_chunks(&self) -> &[i32] {
        &self.visible.chunks
    }

    /* -------------------------------------------------------
       housekeeping
       ------------------------------------------------------- */

    /// forget cached entries whose chunk is gone
    pub fn prune_visible(&mut self) {
        let chunks = &self.chunks;
        self.visible.chunks.retain(|index| chunks.contains_key(index));
    }

    pub fn trim_pool(&mut self) {
        self.free_buffers.truncate(MAX_POOLED_CHUNKS);
    }

    pub fn pooled_buffers(&self) -> usize {
        self.free_buffers.len()
    }

    /// Drop every chunk (buffers are kept for reuse).
    pub fn clear(&mut self) {
        for (_, chunk) in self.chunks.drain() {
            self.free_buffers.push(chunk.into_tiles());
        }
        self.free_buffers.truncate(MAX_POOLED_CHUNKS);
        self.visible = VisibleChunks::default();
    }
}
