//! Distance-driven difficulty curve.
//!
//! Difficulty stays at the baseline during the grace distance, then rises
//! by `obstacle_scaling` every `difficulty_interval` tiles until it hits the
//! level's cap. An adaptive multiplier supplied from outside scales both the
//! curve and the cap.

use serde::{Deserialize, Serialize};

use crate::constants::GRACE_DISTANCE;
use crate::terrain::TerrainType;

/* ===========================================================
   configuration table
   =========================================================== */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

/// Per-level scaling constants, chosen before a run starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    /// Distance (tiles) between difficulty steps.
    pub difficulty_interval: f64,
    /// Difficulty gained per completed interval.
    pub obstacle_scaling: f64,
    /// Gap-size multiplier gained per completed interval.
    pub gap_scaling: f64,
    /// Hard cap on the base difficulty.
    pub max_difficulty_multiplier: f64,
}

impl DifficultyLevel {
    /// case-insensitive lookup used by the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "easy" => Some(DifficultyLevel::Easy),
            "medium" => Some(DifficultyLevel::Medium),
            "hard" => Some(DifficultyLevel::Hard),
            "extreme" => Some(DifficultyLevel::Extreme),
            _ => None,
        }
    }

    pub fn settings(self) -> DifficultySettings {
        let (interval, obstacle, gap, cap) = match self {
            DifficultyLevel::Easy => (1500.0, 0.10, 0.05, 2.0),
            DifficultyLevel::Medium => (1000.0, 0.15, 0.08, 3.0),
            DifficultyLevel::Hard => (750.0, 0.20, 0.10, 4.0),
            DifficultyLevel::Extreme => (500.0, 0.30, 0.15, 5.0),
        };
        DifficultySettings {
            difficulty_interval: interval,
            obstacle_scaling: obstacle,
            gap_scaling: gap,
            max_difficulty_multiplier: cap,
        }
    }
}

impl Default for DifficultySettings {
    fn default() -> Self {
        DifficultyLevel::default().settings()
    }
}

/* ===========================================================
   state
   =========================================================== */
/// Snapshot of the curve plus terrain-type continuity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyState {
    pub distance: f64,
    pub intervals_completed: u32,
    /// Final scalar, ≥ 1 × adaptive multiplier.
    pub difficulty: f64,
    pub obstacle_frequency: f64,
    pub gap_size_multiplier: f64,
    pub pattern_frequency: f64,
    pub last_terrain: Option<TerrainType>,
    pub terrain_streak: u32,
}

impl Default for DifficultyState {
    fn default() -> Self {
        Self {
            distance: 0.0,
            intervals_completed: 0,
            difficulty: 1.0,
            obstacle_frequency: 1.0,
            gap_size_multiplier: 1.0,
            pattern_frequency: 1.0,
            last_terrain: None,
            terrain_streak: 0,
        }
    }
}

impl DifficultyState {
    /// Track how many chunks in a row used the same terrain type.
    pub fn record_terrain(&mut self, terrain: TerrainType) {
        if self.last_terrain == Some(terrain) {
            self.terrain_streak += 1;
        } else {
            self.last_terrain = Some(terrain);
            self.terrain_streak = 1;
        }
    }
}

/// Read-only view for UI display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyInfo {
    pub level: DifficultyLevel,
    pub distance: f64,
    pub in_grace_period: bool,
    /// `None` once the cap has been reached.
    pub distance_to_next_increase: Option<f64>,
    pub difficulty: f64,
    pub obstacle_frequency: f64,
    pub gap_size_multiplier: f64,
    pub pattern_frequency: f64,
    pub adaptive_multiplier: f64,
}

/* ===========================================================
   curve
   =========================================================== */
#[derive(Clone, Debug)]
pub struct DifficultyCurve {
    level: DifficultyLevel,
    settings: DifficultySettings,
    adaptive_multiplier: f64,
    state: DifficultyState,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self::new(DifficultyLevel::default())
    }
}

impl DifficultyCurve {
    pub fn new(level: DifficultyLevel) -> Self {
        Self::with_settings(level, level.settings())
    }

    /// Use a custom table row instead of the built-in one for `level`.
    pub fn with_settings(level: DifficultyLevel, settings: DifficultySettings) -> Self {
        Self {
            level,
            settings,
            adaptive_multiplier: 1.0,
            state: DifficultyState::default(),
        }
    }

    pub fn level(&self) -> DifficultyLevel {
        self.level
    }

    pub fn settings(&self) -> DifficultySettings {
        self.settings
    }

    pub fn state(&self) -> &DifficultyState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DifficultyState {
        &mut self.state
    }

    pub fn adaptive_multiplier(&self) -> f64 {
        self.adaptive_multiplier
    }

    /// Non-finite or non-positive values fall back to 1.0.
    pub fn set_adaptive_multiplier(&mut self, multiplier: f64) {
        self.adaptive_multiplier = if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        };
        let distance = self.state.distance;
        self.update(distance);
    }

    pub fn set_level(&mut self, level: DifficultyLevel) {
        self.level = level;
        self.settings = level.settings();
        let distance = self.state.distance;
        self.update(distance);
    }

    /// Back to distance 0; level, settings and adaptive multiplier are kept.
    pub fn reset(&mut self) {
        self.state = DifficultyState::default();
        self.update(0.0);
    }

    fn interval(&self) -> f64 {
        let interval = self.settings.difficulty_interval;
        if interval.is_finite() && interval >= 1.0 {
            interval
        } else {
            1.0
        }
    }

    fn cap(&self) -> f64 {
        let cap = self.settings.max_difficulty_multiplier;
        if cap.is_finite() {
            cap.max(1.0)
        } else {
            1.0
        }
    }

    /// Recompute every derived value for `distance` tiles travelled.
    pub fn update(&mut self, distance: f64) -> DifficultyState {
        let distance = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
        let adjusted = (distance - GRACE_DISTANCE).max(0.0);
        let intervals = (adjusted / self.interval()).floor();

        let s = &self.settings;
        let base = 1.0 + intervals * s.obstacle_scaling.max(0.0);
        let difficulty =
            (base * self.adaptive_multiplier).min(self.cap() * self.adaptive_multiplier);

        self.state.distance = distance;
        self.state.intervals_completed = intervals.min(u32::MAX as f64) as u32;
        self.state.difficulty = difficulty;
        self.state.obstacle_frequency = difficulty;
        self.state.gap_size_multiplier = 1.0 + intervals * s.gap_scaling.max(0.0);
        self.state.pattern_frequency = (1.0 + intervals * 0.1).min(2.0);
        self.state
    }

    pub fn info(&self) -> DifficultyInfo {
        let distance = self.state.distance;
        let in_grace_period = distance < GRACE_DISTANCE;
        let capped = self.state.difficulty >= self.cap() * self.adaptive_multiplier;

        let distance_to_next_increase = if in_grace_period {
            Some(GRACE_DISTANCE - distance + self.interval())
        } else if capped || self.settings.obstacle_scaling <= 0.0 {
            None
        } else {
            let adjusted = distance - GRACE_DISTANCE;
            Some(self.interval() - adjusted.rem_euclid(self.interval()))
        };

        DifficultyInfo {
            level: self.level,
            distance,
            in_grace_period,
            distance_to_next_increase,
            difficulty: self.state.difficulty,
            obstacle_frequency: self.state.obstacle_frequency,
            gap_size_multiplier: self.state.gap_size_multiplier,
            pattern_frequency: self.state.pattern_frequency,
            adaptive_multiplier: self.adaptive_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(interval: f64, scaling: f64, cap: f64) -> DifficultyCurve {
        DifficultyCurve::with_settings(
            DifficultyLevel::Medium,
            DifficultySettings {
                difficulty_interval: interval,
                obstacle_scaling: scaling,
                gap_scaling: 0.1,
                max_difficulty_multiplier: cap,
            },
        )
    }

    #[test]
    fn test_baseline_during_grace() {
        let mut c = curve(100.0, 0.5, 10.0);
        c.set_adaptive_multiplier(1.3);
        for d in [-50.0, 0.0, 1.0, 250.0, 499.9, 500.0] {
            let s = c.update(d);
            assert!(
                (s.difficulty - 1.3).abs() < 1e-9,
                "distance {} gave {}",
                d,
                s.difficulty
            );
        }
        c.update(499.0);
        assert!(c.info().in_grace_period);
    }

    #[test]
    fn test_three_intervals_scenario() {
        let mut c = curve(1000.0, 0.5, 5.0);
        let s = c.update(1000.0 * 3.0 + 501.0);
        assert_eq!(s.intervals_completed, 3);
        assert!((s.difficulty - 2.5).abs() < 1e-9);
        assert!((s.obstacle_frequency - 2.5).abs() < 1e-9);
        assert!((s.gap_size_multiplier - 1.3).abs() < 1e-9);
        assert!((s.pattern_frequency - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_in_distance() {
        for level in [
            DifficultyLevel::Easy,
            DifficultyLevel::Medium,
            DifficultyLevel::Hard,
            DifficultyLevel::Extreme,
        ] {
            let mut c = DifficultyCurve::new(level);
            c.set_adaptive_multiplier(0.9);
            let mut prev = 0.0;
            let mut d = 0.0;
            while d < 50_000.0 {
                let s = c.update(d);
                assert!(s.difficulty >= prev, "{:?} dropped at {}", level, d);
                prev = s.difficulty;
                d += 37.5;
            }
        }
    }

    #[test]
    fn test_cap_scales_with_adaptive() {
        let mut c = curve(10.0, 1.0, 3.0);
        c.set_adaptive_multiplier(2.0);
        let s = c.update(1_000_000.0);
        assert!((s.difficulty - 6.0).abs() < 1e-9);
        assert_eq!(c.info().distance_to_next_increase, None);
    }

    #[test]
    fn test_pattern_frequency_capped() {
        let mut c = curve(10.0, 0.0, 3.0);
        let s = c.update(10_000.0);
        assert!((s.pattern_frequency - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_corrupt_inputs_clamped() {
        let mut c = curve(0.0, 0.5, f64::NAN);
        let s = c.update(f64::NAN);
        assert_eq!(s.distance, 0.0);
        assert!((s.difficulty - 1.0).abs() < 1e-9);
        c.set_adaptive_multiplier(-3.0);
        assert_eq!(c.adaptive_multiplier(), 1.0);
    }

    #[test]
    fn test_distance_to_next_increase() {
        let mut c = curve(100.0, 0.5, 10.0);
        c.update(450.0);
        assert_eq!(c.info().distance_to_next_increase, Some(150.0));
        c.update(530.0);
        let info = c.info();
        assert!(!info.in_grace_period);
        assert_eq!(info.distance_to_next_increase, Some(70.0));
    }

    #[test]
    fn test_terrain_streak() {
        let mut s = DifficultyState::default();
        s.record_terrain(TerrainType::Hazardous);
        s.record_terrain(TerrainType::Hazardous);
        assert_eq!(s.terrain_streak, 2);
        s.record_terrain(TerrainType::Valley);
        assert_eq!(s.terrain_streak, 1);
        assert_eq!(s.last_terrain, Some(TerrainType::Valley));
    }

    #[test]
    fn test_level_from_name() {
        assert_eq!(DifficultyLevel::from_name("HARD"), Some(DifficultyLevel::Hard));
        assert_eq!(DifficultyLevel::from_name("nightmare"), None);
    }

    #[test]
    fn test_settings_deserialize() {
        let json = r#"{"difficulty_interval":800.0,"obstacle_scaling":0.25,
                       "gap_scaling":0.1,"max_difficulty_multiplier":3.5}"#;
        let parsed: DifficultySettings = serde_json::from_str(json).expect("valid settings");
        assert_eq!(parsed.difficulty_interval, 800.0);
        let level: DifficultyLevel = serde_json::from_str("\"Hard\"").expect("valid level");
        assert_eq!(level.settings(), DifficultyLevel::Hard.settings());
    }
}
