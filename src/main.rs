//! headless driver for the runner terrain generator
//!
//! usage: `runner_terrain [seed] [easy|medium|hard|extreme]`
//! Scrolls a virtual camera to the right and logs difficulty progress.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use runner_terrain::rng::DEFAULT_SEED;
use runner_terrain::{DifficultyLevel, WorldGenPlugin, WorldGenSettings};

/* ------------------------------------------------------------------------ */
/* spawn report                                                             */
/* ------------------------------------------------------------------------ */
fn report_spawn(world: Res<runner_terrain::WorldGenerator>, mut done: Local<bool>) {
    if *done || world.chunk(0).is_none() {
        return;
    }
    let spawn = world.find_safe_spawn_position();
    info!("safe spawn at ({:.0}, {:.0})", spawn.x, spawn.y);
    *done = true;
}

/* ------------------------------------------------------------------------ */
/* main                                                                     */
/* ------------------------------------------------------------------------ */
fn main() {
    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    let level = args
        .next()
        .and_then(|s| DifficultyLevel::from_name(&s))
        .unwrap_or_default();

    App::new()
        /* headless core --------------------------------------------------- */
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
            LogPlugin::default(),
        ))

        /* world ----------------------------------------------------------- */
        .insert_resource(WorldGenSettings {
            seed,
            level,
            ..default()
        })
        .add_plugins(WorldGenPlugin)
        .add_systems(PostUpdate, report_spawn)
        .run();
}
