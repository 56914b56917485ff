//! world orchestration: per-frame streaming, difficulty & public queries
//!
//! `WorldGenerator` is the single Bevy resource physics / rendering talk to.
//! Each frame it advances the difficulty curve, builds chunks entering the
//! generation window, evicts chunks behind the camera and, every
//! `CLEANUP_INTERVAL_SECS`, prunes the spacing ledger and the caches.

use bevy::log::{debug, info, warn};
use bevy::prelude::*;

use crate::camera::{auto_scroll_system, RunnerCamera};
use crate::chunk_gen::ChunkGenerator;
use crate::chunk_store::{eviction_threshold, ChunkStore};
use crate::constants::*;
use crate::difficulty::{DifficultyCurve, DifficultyInfo, DifficultyLevel};
use crate::params::PlayerUpgrades;
use crate::rng::DEFAULT_SEED;
use crate::spacing::SpacingLedger;
use crate::terrain::{pixel_to_tile, Chunk, Tile};

/// used when chunk 0 has no three-column safe run
pub const FALLBACK_SPAWN: Vec2 = Vec2::new(
    TILE_SIZE * 2.5,
    BASE_GROUND_LEVEL as f32 * TILE_SIZE,
);

const SAFE_SPAWN_WIDTH: i32 = 3;
const SAFE_SPAWN_HEADROOM: i32 = 2;

/* ===========================================================
   settings resource
   =========================================================== */
#[derive(Resource, Clone, Debug)]
pub struct WorldGenSettings {
    pub seed: u64,
    pub level: DifficultyLevel,
    pub upgrades: PlayerUpgrades,
}

impl Default for WorldGenSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            level: DifficultyLevel::default(),
            upgrades: PlayerUpgrades::default(),
        }
    }
}

/* ===========================================================
   world generator resource
   =========================================================== */
#[derive(Resource)]
pub struct WorldGenerator {
    seed: u64,
    store: ChunkStore,
    generator: ChunkGenerator,
    curve: DifficultyCurve,
    upgrades: PlayerUpgrades,
    camera_x: f32,
    cleanup_timer: f32,
}

impl Default for WorldGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, DifficultyLevel::default())
    }
}

impl WorldGenerator {
    pub fn new(seed: u64, level: DifficultyLevel) -> Self {
        Self {
            seed,
            store: ChunkStore::new(),
            generator: ChunkGenerator::new(seed),
            curve: DifficultyCurve::new(level),
            upgrades: PlayerUpgrades::default(),
            camera_x: 0.0,
            cleanup_timer: 0.0,
        }
    }

    pub fn from_settings(settings: &WorldGenSettings) -> Self {
        let mut world = Self::new(settings.seed, settings.level);
        world.upgrades = settings.upgrades;
        world
    }

    /* -------------------------------------------------------
       per-frame driver
       ------------------------------------------------------- */

    /// One frame: difficulty, generation, eviction, periodic cleanup.
    pub fn update(&mut self, delta_secs: f32, camera_x: f32) {
        let camera_x = if camera_x.is_finite() {
            clamp_camera(camera_x)
        } else {
            warn!(
                "non-finite camera position {}, keeping {}",
                camera_x, self.camera_x
            );
            self.camera_x
        };
        let dt = if delta_secs.is_finite() { delta_secs.max(0.0) } else { 0.0 };
        self.camera_x = camera_x;

        self.advance_difficulty(camera_x);
        self.ensure_generated(camera_x);
        self.evict_behind(camera_x);
        self.store.update_visible(camera_x);

        self.cleanup_timer += dt;
        if self.cleanup_timer >= CLEANUP_INTERVAL_SECS {
            self.cleanup_timer = 0.0;
            self.periodic_cleanup();
        }
    }

    /// distance is the furthest point reached, in tiles
    fn advance_difficulty(&mut self, camera_x: f32) {
        let travelled = (camera_x / TILE_SIZE).max(0.0) as f64;
        let distance = self.curve.state().distance.max(travelled);
        let before = self.curve.state().intervals_completed;
        let state = self.curve.update(distance);
        if state.intervals_completed > before {
            info!(
                "difficulty rose to {:.2} after {:.0} tiles",
                state.difficulty, state.distance
            );
        }
    }

    /// Build every chunk the camera's window is missing.
    pub fn ensure_generated(&mut self, camera_x: f32) -> usize {
        let camera_x = clamp_camera(camera_x);
        let generator = &mut self.generator;
        let state = self.curve.state_mut();
        let upgrades = self.upgrades;
        self.store.ensure_generated(camera_x, |index, buffer| {
            generator.generate(index, state, upgrades, buffer)
        })
    }

    /// Drop chunks behind the camera and the ledger entries they owned.
    pub fn evict_behind(&mut self, camera_x: f32) -> usize {
        let camera_x = clamp_camera(camera_x);
        let evicted = self.store.evict_behind(camera_x);
        if evicted > 0 {
            let min_x = first_kept_column(camera_x);
            self.generator.ledger_mut().prune_before(min_x);
        }
        evicted
    }

    fn periodic_cleanup(&mut self) {
        let min_x = first_kept_column(self.camera_x);
        let pruned = self.generator.ledger_mut().prune_before(min_x);
        self.store.prune_visible();
        self.store.trim_pool();
        debug!(
            "cleanup: pruned {} ledger entries, {} chunks loaded, {} buffers pooled",
            pruned,
            self.store.len(),
            self.store.pooled_buffers()
        );
    }

    /* -------------------------------------------------------
       run control
       ------------------------------------------------------- */

    /// Fresh run with the same seed.
    pub fn reset(&mut self) {
        self.reset_with_seed(self.seed);
    }

    pub fn reset_with_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.store.clear();
        self.generator.reset(seed);
        self.curve.reset();
        self.camera_x = 0.0;
        self.cleanup_timer = 0.0;
        info!("world reset (seed {}, {:?})", seed, self.curve.level());
    }

    pub fn set_adaptive_multiplier(&mut self, multiplier: f64) {
        self.curve.set_adaptive_multiplier(multiplier);
    }

    pub fn set_difficulty_level(&mut self, level: DifficultyLevel) {
        self.curve.set_level(level);
    }

    pub fn set_upgrades(&mut self, upgrades: PlayerUpgrades) {
        self.upgrades = upgrades;
    }

    /* -------------------------------------------------------
       queries
       ------------------------------------------------------- */
    pub fn tile_at(&self, tx: i32, ty: i32) -> Tile {
        self.store.tile_at(tx, ty)
    }

    /// pixel-space lookup (y grows downward like tile rows)
    pub fn tile_at_world(&self, px: f32, py: f32) -> Tile {
        self.store.tile_at(pixel_to_tile(px), pixel_to_tile(py))
    }

    pub fn set_tile(&mut self, tx: i32, ty: i32, tile: Tile) -> bool {
        self.store.set_tile(tx, ty, tile)
    }

    /// Consume a data packet; `false` if there was none.
    pub fn collect_packet(&mut self, tx: i32, ty: i32) -> bool {
        self.store.tile_at(tx, ty) == Tile::DataPacket && self.store.set_tile(tx, ty, Tile::Empty)
    }

    #[inline]
    pub fn is_solid(&self, tx: i32, ty: i32) -> bool {
        self.tile_at(tx, ty).is_solid()
    }

    #[inline]
    pub fn is_hazard(&self, tx: i32, ty: i32) -> bool {
        self.tile_at(tx, ty).is_hazard()
    }

    /// Feet position on the first three-column hazard-free floor run of
    /// chunk 0, in pixels.
    pub fn find_safe_spawn_position(&self) -> Vec2 {
        let Some(chunk) = self.store.chunk(0) else {
            return FALLBACK_SPAWN;
        };
        let g = chunk.ground_level;
        let column_ok = |x: i32| {
            chunk.get(x, g) == Tile::Floor
                && (1..=SAFE_SPAWN_HEADROOM).all(|dy| !chunk.get(x, g - dy).is_hazard())
        };

        (0..=CHUNK_WIDTH as i32 - SAFE_SPAWN_WIDTH)
            .find(|&x| (x..x + SAFE_SPAWN_WIDTH).all(column_ok))
            .map_or(FALLBACK_SPAWN, |x| {
                Vec2::new((x + 1) as f32 * TILE_SIZE + TILE_SIZE * 0.5, g as f32 * TILE_SIZE)
            })
    }

    pub fn difficulty_info(&self) -> DifficultyInfo {
        self.curve.info()
    }

    pub fn chunk(&self, index: i32) -> Option<&Chunk> {
        self.store.chunk(index)
    }

    pub fn loaded_chunks(&self) -> Vec<i32> {
        self.store.indices()
    }

    pub fn visible_chunks(&self) -> &[i32] {
        self.store.visible_chunks()
    }

    pub fn ledger(&self) -> &SpacingLedger {
        self.generator.ledger()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn camera_x(&self) -> f32 {
        self.camera_x
    }
}

/// finite camera x, kept where chunk arithmetic cannot overflow
fn clamp_camera(camera_x: f32) -> f32 {
    if camera_x.abs() > MAX_CAMERA_PX {
        warn!("camera position {} out of range, clamping", camera_x);
    }
    camera_x.clamp(-MAX_CAMERA_PX, MAX_CAMERA_PX)
}

/// world column of the first chunk that survives eviction
fn first_kept_column(camera_x: f32) -> i32 {
    eviction_threshold(camera_x).saturating_mul(CHUNK_WIDTH as i32)
}

/* ===========================================================
   systems
   =========================================================== */
pub fn world_update_system(
    time: Res<Time>,
    camera: Res<RunnerCamera>,
    mut world: ResMut<WorldGenerator>,
) {
    world.update(time.delta_secs(), camera.pixel_x());
}

/// periodic progress line
pub fn log_progress_system(time: Res<Time>, world: Res<WorldGenerator>, mut elapsed: Local<f32>) {
    *elapsed += time.delta_secs();
    if *elapsed < CLEANUP_INTERVAL_SECS {
        return;
    }
    *elapsed = 0.0;

    let info = world.difficulty_info();
    info!(
        "distance {:.0} | difficulty {:.2} | next step in {} | chunks {:?}",
        info.distance,
        info.difficulty,
        info.distance_to_next_increase
            .map_or_else(|| "-".to_string(), |d| format!("{:.0}", d)),
        world.loaded_chunks()
    );
}

/* ===========================================================
   plugin
   =========================================================== */
pub struct WorldGenPlugin;

impl Plugin for WorldGenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldGenSettings>();
        app.init_resource::<RunnerCamera>();

        let settings = app.world().resource::<WorldGenSettings>().clone();
        app.insert_resource(WorldGenerator::from_settings(&settings));

        app.add_systems(
            Update,
            (
                auto_scroll_system,
                world_update_system.after(auto_scroll_system),
                log_progress_system.after(world_update_system),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK_PX: f32 = CHUNK_WIDTH as f32 * TILE_SIZE;

    #[test]
    fn test_first_update_builds_spawn() {
        let mut world = WorldGenerator::new(3, DifficultyLevel::Medium);
        world.update(0.016, 0.0);
        let chunk = world.chunk(0).expect("chunk 0 generated");
        assert_eq!(chunk.terrain, crate::terrain::TerrainType::Spawn);
        assert_eq!(world.tile_at(2, BASE_GROUND_LEVEL), Tile::Floor);
        assert_eq!(
            world.loaded_chunks(),
            (0..=GENERATION_DISTANCE).collect::<Vec<_>>()
        );
        assert!(!world.visible_chunks().is_empty());
    }

    #[test]
    fn test_safe_spawn_position() {
        for seed in 0..30 {
            let mut world = WorldGenerator::new(seed, DifficultyLevel::Extreme);
            world.update(0.016, 0.0);
            let spawn = world.find_safe_spawn_position();
            assert_ne!(spawn, FALLBACK_SPAWN);

            let tx = pixel_to_tile(spawn.x);
            let feet_row = pixel_to_tile(spawn.y);
            for x in tx - 1..=tx + 1 {
                assert_eq!(world.tile_at(x, feet_row), Tile::Floor);
                for dy in 1..=2 {
                    assert_ne!(world.tile_at(x, feet_row - dy), Tile::Spike);
                }
            }
        }
    }

    #[test]
    fn test_spawn_fallback_without_chunk_zero() {
        let world = WorldGenerator::default();
        assert_eq!(world.find_safe_spawn_position(), FALLBACK_SPAWN);
    }

    #[test]
    fn test_distance_never_decreases() {
        let mut world = WorldGenerator::default();
        world.update(0.016, 40_000.0);
        let far = world.difficulty_info().distance;
        world.update(0.016, 100.0);
        assert_eq!(world.difficulty_info().distance, far);
    }

    #[test]
    fn test_non_finite_camera_ignored() {
        let mut world = WorldGenerator::default();
        world.update(0.016, CHUNK_PX * 2.0);
        let loaded = world.loaded_chunks();
        world.update(f32::NAN, f32::NAN);
        assert_eq!(world.camera_x(), CHUNK_PX * 2.0);
        assert_eq!(world.loaded_chunks(), loaded);
    }

    #[test]
    fn test_far_camera_positions_clamped() {
        let mut world = WorldGenerator::default();
        world.update(0.016, 1.0e12);
        assert_eq!(world.camera_x(), MAX_CAMERA_PX);
        let current = crate::terrain::chunk_of_pixel(MAX_CAMERA_PX);
        assert!(world.chunk(current + GENERATION_DISTANCE).is_some());
        assert_eq!(world.tile_at_world(1.0e12, -1.0e12), Tile::Empty);

        let mut world = WorldGenerator::default();
        world.update(0.016, 0.0);
        world.update(CLEANUP_INTERVAL_SECS + 1.0, -1.0e12);
        assert_eq!(world.camera_x(), -MAX_CAMERA_PX);
        assert!(world.loaded_chunks().iter().all(|&i| i >= 0));

        assert_eq!(world.ensure_generated(-1.0e12), 0);
        world.evict_behind(1.0e12);
        assert!(world.loaded_chunks().is_empty());
    }

    #[test]
    fn test_streaming_keeps_window_and_evicts() {
        let mut world = WorldGenerator::new(11, DifficultyLevel::Hard);
        let mut camera = 0.0;
        while camera < CHUNK_PX * 40.0 {
            world.update(1.0 / 60.0, camera);
            camera += 9.0;
        }
        let current = crate::terrain::chunk_of_pixel(camera - 9.0);
        let loaded = world.loaded_chunks();
        assert!(loaded.iter().all(|&i| i >= current - CLEANUP_DISTANCE));
        assert!(loaded.contains(&(current + GENERATION_DISTANCE)));
        let min_x = (current - CLEANUP_DISTANCE) * CHUNK_WIDTH as i32;
        assert!(world.ledger().positions().iter().all(|p| p.x >= min_x));
    }

    #[test]
    fn test_collect_packet() {
        let mut world = WorldGenerator::default();
        world.update(0.016, 0.0);
        assert!(world.set_tile(50, 5, Tile::DataPacket));
        assert!(world.collect_packet(50, 5));
        assert_eq!(world.tile_at(50, 5), Tile::Empty);
        assert!(!world.collect_packet(50, 5));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut world = WorldGenerator::new(5, DifficultyLevel::Medium);
        let mut camera = 0.0;
        for _ in 0..2_000 {
            world.update(1.0 / 60.0, camera);
            camera += 40.0;
        }
        assert!(world.difficulty_info().distance > GRACE_DISTANCE);

        world.reset();
        assert!(world.loaded_chunks().is_empty());
        assert!(world.ledger().is_empty());
        assert_eq!(world.difficulty_info().distance, 0.0);
        assert!(world.difficulty_info().in_grace_period);

        world.update(0.016, 0.0);
        let first = world.chunk(1).map(|c| (c.terrain, c.ground_level));
        let mut fresh = WorldGenerator::new(5, DifficultyLevel::Medium);
        fresh.update(0.016, 0.0);
        assert_eq!(first, fresh.chunk(1).map(|c| (c.terrain, c.ground_level)));
    }

    #[test]
    fn test_plugin_inserts_world() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(WorldGenSettings {
            seed: 9,
            level: DifficultyLevel::Easy,
            upgrades: PlayerUpgrades::default(),
        });
        app.add_plugins(WorldGenPlugin);
        app.update();

        let world = app.world().resource::<WorldGenerator>();
        assert_eq!(world.seed(), 9);
        assert_eq!(world.difficulty_info().level, DifficultyLevel::Easy);
        assert!(world.chunk(0).is_some());
    }
}
