//! End-to-end run through the public API: reset, spawn, streaming and the
//! difficulty curve.

use runner_terrain::constants::{
    BASE_GROUND_LEVEL, CHUNK_HEIGHT, CHUNK_WIDTH, CLEANUP_DISTANCE, TILE_SIZE,
};
use runner_terrain::terrain::chunk_of_pixel;
use runner_terrain::{
    DifficultyCurve, DifficultyLevel, DifficultySettings, PlayerUpgrades, TerrainType, Tile,
    WorldGenerator,
};

const CHUNK_PX: f32 = CHUNK_WIDTH as f32 * TILE_SIZE;

#[test]
fn fresh_world_starts_on_flat_spawn() {
    let mut world = WorldGenerator::new(2024, DifficultyLevel::Medium);
    world.reset();
    world.ensure_generated(0.0);

    let spawn = world.chunk(0).expect("chunk 0 exists");
    assert_eq!(spawn.terrain, TerrainType::Spawn);
    assert_eq!(world.tile_at(2, BASE_GROUND_LEVEL), Tile::Floor);

    let pos = world.find_safe_spawn_position();
    let tx = (pos.x / TILE_SIZE).floor() as i32;
    assert_eq!(world.tile_at(tx, BASE_GROUND_LEVEL), Tile::Floor);
}

#[test]
fn difficulty_reaches_expected_scalar() {
    let settings = DifficultySettings {
        difficulty_interval: 400.0,
        obstacle_scaling: 0.5,
        gap_scaling: 0.1,
        max_difficulty_multiplier: 10.0,
    };
    let mut curve = DifficultyCurve::with_settings(DifficultyLevel::Hard, settings);
    let state = curve.update(settings.difficulty_interval * 3.0 + 501.0);
    assert!((state.difficulty - 2.5).abs() < 1e-9);
}

#[test]
fn long_run_stays_bounded_and_queryable() {
    let mut world = WorldGenerator::new(99, DifficultyLevel::Extreme);
    world.set_upgrades(PlayerUpgrades {
        safe_spacing: true,
        bonus_packets: true,
    });
    world.set_adaptive_multiplier(1.2);

    let mut camera = 0.0;
    let mut max_loaded = 0;
    for _ in 0..6_000 {
        world.update(1.0 / 60.0, camera);
        max_loaded = max_loaded.max(world.loaded_chunks().len());
        camera += 24.0;
    }
    assert!(max_loaded <= 10, "loaded {} chunks at once", max_loaded);
    assert!(world.difficulty_info().difficulty > 1.2);

    let evicted = chunk_of_pixel(camera) - CLEANUP_DISTANCE - 1;
    let tx = evicted * CHUNK_WIDTH as i32;
    for ty in 0..CHUNK_HEIGHT as i32 {
        assert_eq!(world.tile_at(tx, ty), Tile::Empty);
    }

    let current = chunk_of_pixel(camera - 24.0);
    let chunk = world.chunk(current).expect("current chunk loaded");
    assert!(chunk.generated);
    let ground = chunk.ground_level;
    let base = current * CHUNK_WIDTH as i32;
    let ground_tiles = (base..base + CHUNK_WIDTH as i32)
        .filter(|&x| matches!(world.tile_at(x, ground), Tile::Floor | Tile::Gap))
        .count();
    assert_eq!(ground_tiles, CHUNK_WIDTH);
    assert!(world.tile_at_world(-CHUNK_PX * 3.0, 0.0) == Tile::Empty);
}
