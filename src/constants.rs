/// -------- tiles & chunk size --------
pub const TILE_SIZE: f32 = 32.0;
pub const CHUNK_WIDTH: usize  = 32;
pub const CHUNK_HEIGHT: usize = 20;

/// -------- streaming window (in chunks) --------
pub const GENERATION_DISTANCE: i32 = 3;
pub const CLEANUP_DISTANCE: i32    = 3;
pub const VIEW_WIDTH: f32          = 1280.0;
/// camera x is clamped to ±this many pixels
pub const MAX_CAMERA_PX: f32       = 1.0e9;

/// -------- ground line --------
pub const BASE_GROUND_LEVEL: i32     = 14;
pub const FALLBACK_GROUND_LEVEL: i32 = 10;
pub const MIN_GROUND_LEVEL: i32      = 8;
pub const MAX_GROUND_LEVEL: i32      = CHUNK_HEIGHT as i32 - 3;
pub const GROUND_SMOOTHING: f32      = 0.3;

/// first columns of chunk 0 are always bare floor
pub const SAFE_SPAWN_COLUMNS: usize = 5;

/// -------- difficulty --------
pub const GRACE_DISTANCE: f64 = 500.0;
pub const MAX_GROUND_DIFFICULTY_BONUS: f32 = 15.0;

/// -------- obstacle spacing (in tiles) --------
pub const MIN_OBSTACLE_SPACING: i32 = 4;
pub const SAW_MIN_DISTANCE: i32     = 5;

/// -------- obstacle patterns --------
pub const PATTERN_MIN_RUN: usize     = 9;
pub const GAUNTLET_RUN: usize        = 13;
pub const PATTERN_BASE_CHANCE: f32   = 30.0;
pub const PATTERN_MAX_CHANCE: f32    = 60.0;
pub const GAUNTLET_SHARE: f64        = 0.45;

/// -------- periodic housekeeping --------
pub const CLEANUP_INTERVAL_SECS: f32 = 5.0;
pub const MAX_POOLED_CHUNKS: usize   = 4;
