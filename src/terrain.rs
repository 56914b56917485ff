//! tiles, terrain types, chunks & coordinate helpers
//!
//! Row 0 is the top of a chunk; rows grow downward, so "above" a tile
//! means a smaller row index.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/* ===========================================================
   tiles
   =========================================================== */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tile {
    #[default]
    Empty,
    Floor,
    Platform,
    Gap,
    Spike,
    Saw,
    Laser,
    Crusher,
    DataPacket,
}

impl Tile {
    /// something the runner can stand on
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Floor | Tile::Platform)
    }

    /// touching it ends the run
    #[inline]
    pub fn is_hazard(self) -> bool {
        matches!(self, Tile::Spike | Tile::Saw | Tile::Laser | Tile::Crusher)
    }
}

/* ===========================================================
   terrain types
   =========================================================== */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    Spawn,
    Normal,
    PlatformHeavy,
    Hazardous,
    Elevated,
    Valley,
    Chaotic,
}

impl TerrainType {
    /// every type the per-chunk draw can pick (Spawn is chunk 0 only)
    pub const DRAWABLE: [TerrainType; 6] = [
        TerrainType::Normal,
        TerrainType::PlatformHeavy,
        TerrainType::Hazardous,
        TerrainType::Elevated,
        TerrainType::Valley,
        TerrainType::Chaotic,
    ];

    /// row the drifting ground level is pulled toward
    pub fn target_ground_level(self) -> i32 {
        match self {
            TerrainType::Spawn
            | TerrainType::Normal
            | TerrainType::Hazardous
            | TerrainType::Chaotic => BASE_GROUND_LEVEL,
            TerrainType::PlatformHeavy => BASE_GROUND_LEVEL + 1,
            TerrainType::Elevated => BASE_GROUND_LEVEL - 4,
            TerrainType::Valley => BASE_GROUND_LEVEL + 2,
        }
    }
}

/* ===========================================================
   chunk
   =========================================================== */
#[derive(Clone, Debug)]
pub struct Chunk {
    pub index: i32,
    pub terrain: TerrainType,
    pub ground_level: i32,
    /// longest gap run this chunk was allowed
    pub max_gap_size: u32,
    pub pattern: Option<PatternKind>,
    pub generated: bool,
    tiles: Vec<Tile>,
}

/// hand-authored multi-tile layouts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    SawGauntlet,
    CrusherCorridor,
}

impl Chunk {
    /// blank chunk; `buffer` is a recycled tile grid (any length)
    pub fn new(index: i32, terrain: TerrainType, ground_level: i32, mut buffer: Vec<Tile>) -> Self {
        buffer.clear();
        buffer.resize(CHUNK_WIDTH * CHUNK_HEIGHT, Tile::Empty);
        Self {
            index,
            terrain,
            ground_level,
            max_gap_size: 0,
            pattern: None,
            generated: false,
            tiles: buffer,
        }
    }

    #[inline]
    pub fn idx(x: usize, y: usize) -> usize {
        y * CHUNK_WIDTH + x
    }

    /// world tile column of local column 0
    #[inline]
    pub fn base_x(&self) -> i32 {
        self.index.saturating_mul(CHUNK_WIDTH as i32)
    }

    /// local lookup, `Empty` outside the grid
    pub fn get(&self, x: i32, y: i32) -> Tile {
        if !in_grid(x, y) {
            return Tile::Empty;
        }
        self.tiles[Self::idx(x as usize, y as usize)]
    }

    /// local write, ignored outside the grid
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) -> bool {
        if !in_grid(x, y) {
            return false;
        }
        self.tiles[Self::idx(x as usize, y as usize)] = tile;
        true
    }

    /// write only when the cell is still `Empty`
    pub fn place(&mut self, x: i32, y: i32, tile: Tile) -> bool {
        if !in_grid(x, y) || self.get(x, y) != Tile::Empty {
            return false;
        }
        self.set(x, y, tile)
    }

    pub fn ground_tile(&self, x: i32) -> Tile {
        self.get(x, self.ground_level)
    }

    /// hand the tile buffer back for pooling
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }
}

#[inline]
fn in_grid(x: i32, y: i32) -> bool {
    (0..CHUNK_WIDTH as i32).contains(&x) && (0..CHUNK_HEIGHT as i32).contains(&y)
}

/* ===========================================================
   coordinate helpers
   =========================================================== */

/// chunk index + local column for a world tile column
#[inline]
pub fn split_tile_x(tx: i32) -> (i32, i32) {
    (
        tx.div_euclid(CHUNK_WIDTH as i32),
        tx.rem_euclid(CHUNK_WIDTH as i32),
    )
}

/// pixel → tile (non-finite input maps to tile 0, the rest is clamped to
/// `±MAX_CAMERA_PX`)
#[inline]
pub fn pixel_to_tile(px: f32) -> i32 {
    if !px.is_finite() {
        return 0;
    }
    (px.clamp(-MAX_CAMERA_PX, MAX_CAMERA_PX) / TILE_SIZE).floor() as i32
}

/// chunk the camera currently sits in
#[inline]
pub fn chunk_of_pixel(px: f32) -> i32 {
    split_tile_x(pixel_to_tile(px)).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tile_x_negative() {
        assert_eq!(split_tile_x(0), (0, 0));
        assert_eq!(split_tile_x(CHUNK_WIDTH as i32 + 3), (1, 3));
        assert_eq!(split_tile_x(-1), (-1, CHUNK_WIDTH as i32 - 1));
    }

    #[test]
    fn test_pixel_to_tile_non_finite() {
        assert_eq!(pixel_to_tile(f32::NAN), 0);
        assert_eq!(pixel_to_tile(TILE_SIZE * 2.5), 2);
        assert_eq!(chunk_of_pixel(-1.0), -1);
    }

    #[test]
    fn test_far_pixels_stay_in_range() {
        let far = chunk_of_pixel(1.0e12);
        assert_eq!(far, chunk_of_pixel(MAX_CAMERA_PX));
        assert!(far.checked_add(GENERATION_DISTANCE).is_some());

        let last = far + GENERATION_DISTANCE;
        let chunk = Chunk::new(last, TerrainType::Normal, BASE_GROUND_LEVEL, Vec::new());
        assert!(chunk.base_x().checked_add(CHUNK_WIDTH as i32).is_some());
        assert_eq!(chunk_of_pixel(-1.0e12), chunk_of_pixel(-MAX_CAMERA_PX));

        let huge = Chunk::new(i32::MAX, TerrainType::Normal, BASE_GROUND_LEVEL, Vec::new());
        assert_eq!(huge.base_x(), i32::MAX);
    }

    #[test]
    fn test_chunk_out_of_range_is_empty() {
        let mut chunk = Chunk::new(0, TerrainType::Normal, BASE_GROUND_LEVEL, Vec::new());
        assert_eq!(chunk.get(-1, 0), Tile::Empty);
        assert_eq!(chunk.get(0, CHUNK_HEIGHT as i32), Tile::Empty);
        assert!(!chunk.set(CHUNK_WIDTH as i32, 0, Tile::Floor));
    }

    #[test]
    fn test_place_never_overwrites() {
        let mut chunk = Chunk::new(0, TerrainType::Normal, BASE_GROUND_LEVEL, vec![Tile::Saw; 3]);
        assert_eq!(chunk.get(0, 0), Tile::Empty, "recycled buffer is wiped");
        assert!(chunk.place(1, 1, Tile::Floor));
        assert!(!chunk.place(1, 1, Tile::Spike));
        assert_eq!(chunk.get(1, 1), Tile::Floor);
    }
}
