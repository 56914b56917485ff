//! per-chunk generation probabilities
//!
//! All chances are percentages (0–100). Each value is clamped to a
//! playable maximum after terrain and difficulty scaling.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::MIN_OBSTACLE_SPACING;
use crate::difficulty::DifficultyState;
use crate::terrain::TerrainType;

/* ===========================================================
   upgrade flags (owned by the shop, read-only here)
   =========================================================== */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUpgrades {
    /// "wider safe lane": fewer hazards, longer floor streaks
    pub safe_spacing: bool,
    /// more data packets
    pub bonus_packets: bool,
}

/* ===========================================================
   tunables
   =========================================================== */
const BASE_GAP_CHANCE: f32 = 10.0;
const BASE_SPIKE_CHANCE: f32 = 4.0;
const BASE_SAW_CHANCE: f32 = 3.0;
const BASE_LASER_CHANCE: f32 = 1.5;
const BASE_CRUSHER_CHANCE: f32 = 1.0;
const BASE_MAX_GAP: f64 = 2.0;
const BASE_FLOOR_STREAK: u32 = 3;

const MAX_GAP_CHANCE: f32 = 85.0;
const MAX_SPIKE_CHANCE: f32 = 50.0;
const MAX_SAW_CHANCE: f32 = 60.0;
const MAX_LASER_CHANCE: f32 = 40.0;
const MAX_CRUSHER_CHANCE: f32 = 40.0;
const MAX_GAP_SIZE: u32 = 5;

const CHAOTIC_RANGE: std::ops::RangeInclusive<f32> = 0.8..=1.6;

/* ===========================================================
   parameter bundle
   =========================================================== */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParameters {
    pub gap_chance: f32,
    pub max_gap_size: u32,
    pub min_floor_streak: u32,
    pub spike_chance: f32,
    /// tiles; never below `MIN_OBSTACLE_SPACING`
    pub spike_min_distance: i32,
    pub saw_chance: f32,
    pub laser_chance: f32,
    pub crusher_chance: f32,
}

impl TerrainParameters {
    /// Map terrain type + difficulty + upgrades to a parameter bundle.
    ///
    /// `rng` is only consumed for `Chaotic`, which re-rolls its own
    /// multiplier on every call.
    pub fn compute<R: Rng>(
        terrain: TerrainType,
        state: &DifficultyState,
        has_spacing_upgrade: bool,
        rng: &mut R,
    ) -> Self {
        let d = if state.obstacle_frequency.is_finite() {
            state.obstacle_frequency.max(0.0) as f32
        } else {
            1.0
        };
        let gap_mult = if state.gap_size_multiplier.is_finite() {
            state.gap_size_multiplier.max(1.0)
        } else {
            1.0
        };

        let mut p = TerrainParameters {
            gap_chance: BASE_GAP_CHANCE + 5.0 * (d - 1.0).max(0.0),
            max_gap_size: (BASE_MAX_GAP * gap_mult).round() as u32,
            min_floor_streak: BASE_FLOOR_STREAK,
            spike_chance: BASE_SPIKE_CHANCE * d,
            spike_min_distance: MIN_OBSTACLE_SPACING,
            saw_chance: BASE_SAW_CHANCE * d,
            laser_chance: BASE_LASER_CHANCE * d,
            crusher_chance: BASE_CRUSHER_CHANCE * d,
        };

        match terrain {
            TerrainType::Spawn => {
                p.gap_chance = 0.0;
                p.spike_chance = 0.0;
                p.saw_chance = 0.0;
                p.laser_chance = 0.0;
                p.crusher_chance = 0.0;
            }
            TerrainType::Normal => {}
            TerrainType::PlatformHeavy => {
                p.gap_chance *= 1.5;
                p.saw_chance *= 1.3;
                p.spike_chance *= 0.5;
            }
            TerrainType::Hazardous => {
                p.spike_chance *= 2.0;
                p.saw_chance *= 2.0;
                p.laser_chance *= 2.0;
                p.crusher_chance *= 2.0;
            }
            TerrainType::Elevated => {
                p.gap_chance *= 1.2;
                p.laser_chance *= 1.3;
            }
            TerrainType::Valley => {
                p.gap_chance *= 0.6;
                p.spike_chance *= 0.8;
                p.max_gap_size = p.max_gap_size.saturating_sub(1);
            }
            TerrainType::Chaotic => {
                let m = rng.gen_range(CHAOTIC_RANGE);
                p.gap_chance *= m;
                p.spike_chance *= m;
                p.saw_chance *= m;
                p.laser_chance *= m;
                p.crusher_chance *= m;
            }
        }

        if has_spacing_upgrade {
            p.spike_chance *= 0.5;
            p.saw_chance *= 0.5;
            p.laser_chance *= 0.5;
            p.crusher_chance *= 0.5;
            p.min_floor_streak += 2;
            p.spike_min_distance += 2;
        }

        p.clamped()
    }

    fn clamped(mut self) -> Self {
        self.gap_chance = self.gap_chance.clamp(0.0, MAX_GAP_CHANCE);
        self.spike_chance = self.spike_chance.clamp(0.0, MAX_SPIKE_CHANCE);
        self.saw_chance = self.saw_chance.clamp(0.0, MAX_SAW_CHANCE);
        self.laser_chance = self.laser_chance.clamp(0.0, MAX_LASER_CHANCE);
        self.crusher_chance = self.crusher_chance.clamp(0.0, MAX_CRUSHER_CHANCE);
        self.max_gap_size = self.max_gap_size.clamp(1, MAX_GAP_SIZE);
        self.min_floor_streak = self.min_floor_streak.max(1);
        self.spike_min_distance = self.spike_min_distance.max(MIN_OBSTACLE_SPACING);
        self
    }
}

/// Per-cell data-packet chance in the band above the ground line.
pub fn collectible_chance(terrain: TerrainType, upgrades: PlayerUpgrades) -> f32 {
    let base = match terrain {
        TerrainType::Spawn => 3.0,
        TerrainType::Normal => 2.5,
        TerrainType::PlatformHeavy => 4.0,
        TerrainType::Hazardous => 8.0,
        TerrainType::Elevated => 3.0,
        TerrainType::Valley => 1.5,
        TerrainType::Chaotic => 5.0,
    };
    if upgrades.bonus_packets {
        base * 1.5
    } else {
        base
    }
}
