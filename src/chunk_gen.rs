//! Per-chunk terrain generation.
//!
//! A chunk is built in one pass through a fixed sequence of stages:
//! ground line → platforms → data packets → saws/lasers/crushers → an
//! optional obstacle pattern. Later stages only ever write into `Empty`
//! cells, except that a spike or saw takes the empty cell directly above
//! the floor or platform it sits on.
//!
//! The pattern roll happens in `Init`. A winning roll claims a site: its
//! columns stay bare floor, and no other hazard lands within
//! `MIN_OBSTACLE_SPACING` of it, so the pattern stage finds its run intact.
//!
//! Every hazard is checked against and recorded in the `SpacingLedger`
//! using world coordinates, so spacing holds across chunk borders too.

use bevy::log::{debug, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::ops::RangeInclusive;

use crate::constants::*;
use crate::difficulty::DifficultyState;
use crate::params::{collectible_chance, PlayerUpgrades, TerrainParameters};
use crate::rng::WorldRng;
use crate::spacing::SpacingLedger;
use crate::terrain::{Chunk, PatternKind, TerrainType, Tile};

/* ===========================================================
   tunables
   =========================================================== */
const BASE_TERRAIN_WEIGHTS: [u32; 6] = [30, 20, 15, 15, 10, 10];
const HAZARDOUS_IDX: usize = 2;
const CHAOTIC_IDX: usize = 5;
const MAX_HAZARDOUS_STREAK: u32 = 2;

const PLATFORM_SPIKE_SCALE: f32 = 1.5;
const PLATFORM_SPIKE_MAX: f32 = 25.0;

const COLLECTIBLE_BAND: RangeInclusive<i32> = 1..=6;
const LASER_BAND: RangeInclusive<i32> = 2..=5;
const LASER_MIN_CLEARANCE: usize = 2;
const CRUSHER_STRIKE_ROWS: i32 = 4;
const GAUNTLET_BONUS_CHANCE: f64 = 0.3;

/* ===========================================================
   stage machine
   =========================================================== */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenStage {
    Init,
    GroundLine,
    Platforms,
    SpecialTiles,
    DynamicObstacles,
    Pattern,
    Sealed,
}

impl GenStage {
    pub fn next(self) -> Self {
        match self {
            GenStage::Init => GenStage::GroundLine,
            GenStage::GroundLine => GenStage::Platforms,
            GenStage::Platforms => GenStage::SpecialTiles,
            GenStage::SpecialTiles => GenStage::DynamicObstacles,
            GenStage::DynamicObstacles => GenStage::Pattern,
            GenStage::Pattern | GenStage::Sealed => GenStage::Sealed,
        }
    }
}

/// floor / gap run counters, carried from one chunk into the next
#[derive(Clone, Copy, Debug, Default)]
struct GroundRun {
    floors: u32,
    gaps: u32,
}

/// columns claimed for an obstacle pattern
#[derive(Clone, Copy, Debug)]
struct PatternSite {
    kind: PatternKind,
    x0: i32,
    width: i32,
}

impl PatternSite {
    #[inline]
    fn covers(&self, lx: i32) -> bool {
        (self.x0..self.x0 + self.width).contains(&lx)
    }

    /// closer than the obstacle spacing to any site column
    #[inline]
    fn guards(&self, lx: i32) -> bool {
        let last = self.x0 + self.width - 1;
        lx > self.x0 - MIN_OBSTACLE_SPACING && lx < last + MIN_OBSTACLE_SPACING
    }
}

/// everything one chunk's stages share
struct ChunkJob {
    chunk: Chunk,
    params: TerrainParameters,
    collectible_chance: f32,
    difficulty: f32,
    pattern_frequency: f32,
    site: Option<PatternSite>,
}

impl ChunkJob {
    #[inline]
    fn is_safe_column(&self, lx: i32) -> bool {
        self.chunk.index == 0 && lx < SAFE_SPAWN_COLUMNS as i32
    }

    /// column belongs to the pattern site
    #[inline]
    fn is_reserved(&self, lx: i32) -> bool {
        self.site.is_some_and(|site| site.covers(lx))
    }

    /// no hazard may go here (spawn zone or too close to the site)
    #[inline]
    fn blocks_hazard(&self, lx: i32) -> bool {
        self.is_safe_column(lx) || self.site.is_some_and(|site| site.guards(lx))
    }
}

/* ===========================================================
   generator
   =========================================================== */
pub struct ChunkGenerator {
    rng: WorldRng,
    ledger: SpacingLedger,
    ground_level: f32,
    run: GroundRun,
}

impl ChunkGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: WorldRng::from_seed_u64(seed),
            ledger: SpacingLedger::new(),
            ground_level: BASE_GROUND_LEVEL as f32,
            run: GroundRun::default(),
        }
    }

    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    pub fn ledger(&self) -> &SpacingLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut SpacingLedger {
        &mut self.ledger
    }

    /// current (unrounded) drifting ground row
    pub fn ground_level(&self) -> f32 {
        self.ground_level
    }

    pub fn set_ground_level(&mut self, level: f32) {
        self.ground_level = level;
    }

    /// Build chunk `index`. `buffer` is a recycled tile grid.
    pub fn generate(
        &mut self,
        index: i32,
        state: &mut DifficultyState,
        upgrades: PlayerUpgrades,
        buffer: Vec<Tile>,
    ) -> Chunk {
        let terrain = if index == 0 {
            TerrainType::Spawn
        } else {
            self.select_terrain(state)
        };
        state.record_terrain(terrain);

        let ground = if index == 0 {
            self.ground_level = BASE_GROUND_LEVEL as f32;
            self.run = GroundRun::default();
            BASE_GROUND_LEVEL
        } else {
            self.next_ground_level(terrain)
        };

        let params =
            TerrainParameters::compute(terrain, state, upgrades.safe_spacing, &mut self.rng.0);

        let mut chunk = Chunk::new(index, terrain, ground, buffer);
        chunk.max_gap_size = params.max_gap_size;

        let mut job = ChunkJob {
            chunk,
            params,
            collectible_chance: collectible_chance(terrain, upgrades),
            difficulty: finite_or_one(state.difficulty),
            pattern_frequency: finite_or_one(state.pattern_frequency),
            site: None,
        };

        let mut stage = GenStage::Init;
        while stage != GenStage::Sealed {
            self.run_stage(stage, &mut job);
            stage = stage.next();
        }

        job.chunk.generated = true;
        debug!(
            "generated chunk {} ({:?}, ground row {}, pattern {:?})",
            index, terrain, ground, job.chunk.pattern
        );
        job.chunk
    }

    fn run_stage(&mut self, stage: GenStage, job: &mut ChunkJob) {
        match stage {
            GenStage::Init => job.site = self.claim_pattern_site(job),
            GenStage::Sealed => {}
            GenStage::GroundLine => self.build_ground_line(job),
            GenStage::Platforms => self.build_platforms(job),
            GenStage::SpecialTiles => self.place_collectibles(job),
            GenStage::DynamicObstacles => {
                self.place_saws(job);
                self.place_lasers(job);
                self.place_crushers(job);
            }
            GenStage::Pattern => {
                job.chunk.pattern = self.stamp_pattern(job);
            }
        }
    }

    /* -------------------------------------------------------
       terrain type & ground drift
       ------------------------------------------------------- */

    /// Weighted draw over the six non-spawn types.
    pub fn select_terrain(&mut self, state: &DifficultyState) -> TerrainType {
        WeightedIndex::new(terrain_weights(state))
            .map(|dist| TerrainType::DRAWABLE[dist.sample(&mut self.rng.0)])
            .unwrap_or(TerrainType::Normal)
    }

    /// Ease the ground row toward the terrain's target.
    pub fn next_ground_level(&mut self, terrain: TerrainType) -> i32 {
        if !self.ground_level.is_finite() {
            warn!(
                "ground level corrupted ({}), falling back to row {}",
                self.ground_level, FALLBACK_GROUND_LEVEL
            );
            self.ground_level = FALLBACK_GROUND_LEVEL as f32;
        }

        let mut target = terrain.target_ground_level();
        if terrain == TerrainType::Chaotic {
            target += self.rng.0.gen_range(-2..=2);
        }

        self.ground_level += (target as f32 - self.ground_level) * GROUND_SMOOTHING;
        self.ground_level = self
            .ground_level
            .clamp(MIN_GROUND_LEVEL as f32, MAX_GROUND_LEVEL as f32);
        self.ground_level.round() as i32
    }

    /* -------------------------------------------------------
       ground line
       ------------------------------------------------------- */
    fn build_ground_line(&mut self, job: &mut ChunkJob) {
        let g = job.chunk.ground_level;
        let base_x = job.chunk.base_x();
        let p = job.params;

        let bonus = ((job.difficulty - 1.0) * 5.0).clamp(0.0, MAX_GROUND_DIFFICULTY_BONUS);
        let gap_chance = if p.gap_chance > 0.0 { p.gap_chance + bonus } else { 0.0 };

        for lx in 0..CHUNK_WIDTH as i32 {
            let safe = job.is_safe_column(lx);
            let force_floor = safe
                || job.is_reserved(lx)
                || self.run.gaps >= p.max_gap_size
                || (self.run.gaps == 0 && self.run.floors < p.min_floor_streak);

            if !force_floor && self.rng.roll_percent(gap_chance) {
                job.chunk.set(lx, g, Tile::Gap);
                self.run.gaps += 1;
                self.run.floors = 0;
                continue;
            }

            job.chunk.set(lx, g, Tile::Floor);
            self.run.floors += 1;
            self.run.gaps = 0;

            if job.blocks_hazard(lx) || !self.rng.roll_percent(p.spike_chance) {
                continue;
            }
            let wx = base_x + lx;
            if self.ledger.can_place(wx, None, p.spike_min_distance)
                && job.chunk.place(lx, g - 1, Tile::Spike)
            {
                self.ledger.record_ground_spike(wx, g - 1);
            }
        }
    }

    /* -------------------------------------------------------
       platforms
       ------------------------------------------------------- */
    fn build_platforms(&mut self, job: &mut ChunkJob) {
        let layout = PlatformLayout::for_terrain(job.chunk.terrain);
        let g = job.chunk.ground_level;
        let base_x = job.chunk.base_x();
        let min_x = if job.chunk.index == 0 { SAFE_SPAWN_COLUMNS as i32 + 1 } else { 0 };
        let spike_chance = (job.params.spike_chance * PLATFORM_SPIKE_SCALE).min(PLATFORM_SPIKE_MAX);

        let count = self.rng.0.gen_range(layout.count);
        for _ in 0..count {
            let len = self.rng.0.gen_range(layout.length.clone());
            let max_x = CHUNK_WIDTH as i32 - len;
            if max_x < min_x {
                continue;
            }
            let x0 = self.rng.0.gen_range(min_x..=max_x);
            let y = (g - self.rng.0.gen_range(layout.rows_above.clone())).max(1);
            if (x0..x0 + len).any(|lx| job.is_reserved(lx)) {
                continue;
            }

            for lx in x0..x0 + len {
                job.chunk.place(lx, y, Tile::Platform);
            }

            if !self.rng.roll_percent(spike_chance) {
                continue;
            }
            let sx = self.rng.0.gen_range(x0..x0 + len);
            let wx = base_x + sx;
            if !job.blocks_hazard(sx)
                && job.chunk.get(sx, y) == Tile::Platform
                && self.ledger.can_place(wx, Some(y - 1), job.params.spike_min_distance)
                && job.chunk.place(sx, y - 1, Tile::Spike)
            {
                self.ledger.record_platform_spike(wx, y - 1);
            }
        }
    }

    /* -------------------------------------------------------
       data packets
       ------------------------------------------------------- */
    fn place_collectibles(&mut self, job: &mut ChunkJob) {
        let g = job.chunk.ground_level;
        for lx in 0..CHUNK_WIDTH as i32 {
            if job.is_safe_column(lx) || job.is_reserved(lx) {
                continue;
            }
            for dy in COLLECTIBLE_BAND {
                let y = g - dy;
                if job.chunk.get(lx, y) == Tile::Empty
                    && self.rng.roll_percent(job.collectible_chance)
                {
                    job.chunk.place(lx, y, Tile::DataPacket);
                }
            }
        }
    }

    /* -------------------------------------------------------
       saws / lasers / crushers
       ------------------------------------------------------- */
    fn place_saws(&mut self, job: &mut ChunkJob) {
        if job.params.saw_chance <= 0.0 {
            return;
        }
        let base_x = job.chunk.base_x();
        for lx in 0..CHUNK_WIDTH as i32 {
            if job.blocks_hazard(lx) {
                continue;
            }
            for y in 1..CHUNK_HEIGHT as i32 {
                let under = job.chunk.get(lx, y);
                if !under.is_solid() || job.chunk.get(lx, y - 1) != Tile::Empty {
                    continue;
                }
                let mut chance = job.params.saw_chance;
                if near_gap(&job.chunk, lx) {
                    chance *= 1.5;
                }
                if under == Tile::Platform {
                    chance *= 1.3;
                }
                if !self.rng.roll_percent(chance) {
                    continue;
                }
                let wx = base_x + lx;
                if self.ledger.can_place(wx, None, SAW_MIN_DISTANCE)
                    && job.chunk.place(lx, y - 1, Tile::Saw)
                {
                    self.ledger.record(wx, y - 1);
                }
            }
        }
    }

    fn place_lasers(&mut self, job: &mut ChunkJob) {
        if job.params.laser_chance <= 0.0 {
            return;
        }
        let g = job.chunk.ground_level;
        let base_x = job.chunk.base_x();
        let band_rows = (LASER_BAND.end() - LASER_BAND.start() + 1) as f32;
        let chance = job.params.laser_chance / band_rows;

        for lx in 0..CHUNK_WIDTH as i32 {
            if job.blocks_hazard(lx) {
                continue;
            }
            for dy in LASER_BAND {
                let y = g - dy;
                if job.chunk.get(lx, y) != Tile::Empty
                    || horizontal_clearance(&job.chunk, lx, y) < LASER_MIN_CLEARANCE
                    || !self.rng.roll_percent(chance)
                {
                    continue;
                }
                let wx = base_x + lx;
                if self.ledger.can_place(wx, None, MIN_OBSTACLE_SPACING)
                    && job.chunk.place(lx, y, Tile::Laser)
                {
                    self.ledger.record(wx, y);
                }
            }
        }
    }

    fn place_crushers(&mut self, job: &mut ChunkJob) {
        if job.params.crusher_chance <= 0.0 {
            return;
        }
        let g = job.chunk.ground_level;
        let base_x = job.chunk.base_x();

        for lx in 0..CHUNK_WIDTH as i32 {
            if job.blocks_hazard(lx) {
                continue;
            }
            for y in 0..=(g - CRUSHER_STRIKE_ROWS - 1) {
                if job.chunk.get(lx, y) != Tile::Empty
                    || !(y == 0 || job.chunk.get(lx, y - 1) == Tile::Platform)
                    || !clear_below(&job.chunk, lx, y, CRUSHER_STRIKE_ROWS)
                {
                    continue;
                }
                let mut chance = job.params.crusher_chance;
                if job.chunk.ground_tile(lx) == Tile::Gap {
                    chance *= 2.0;
                }
                if flanked_by_platforms(&job.chunk, lx, y) {
                    chance *= 1.5;
                }
                if !self.rng.roll_percent(chance) {
                    continue;
                }
                let wx = base_x + lx;
                if self.ledger.can_place(wx, None, MIN_OBSTACLE_SPACING)
                    && job.chunk.place(lx, y, Tile::Crusher)
                {
                    self.ledger.record(wx, y);
                }
            }
        }
    }

    /* -------------------------------------------------------
       obstacle patterns
       ------------------------------------------------------- */
    /// Roll for a pattern and pick its kind and columns.
    fn claim_pattern_site(&mut self, job: &ChunkJob) -> Option<PatternSite> {
        if job.chunk.index == 0 {
            return None;
        }
        let chance = (PATTERN_BASE_CHANCE * job.pattern_frequency).min(PATTERN_MAX_CHANCE);
        if !self.rng.roll_percent(chance) {
            return None;
        }

        let (kind, width) = if self.rng.0.gen_bool(GAUNTLET_SHARE) {
            (PatternKind::SawGauntlet, GAUNTLET_RUN as i32)
        } else {
            (PatternKind::CrusherCorridor, PATTERN_MIN_RUN as i32)
        };
        // a left margin keeps the site clear of the previous chunk's hazards
        let x0 = self
            .rng
            .0
            .gen_range(MIN_OBSTACLE_SPACING..=CHUNK_WIDTH as i32 - width);
        Some(PatternSite { kind, x0, width })
    }

    /// Stamp the claimed pattern. A gauntlet that does not fit falls back to
    /// a corridor on the same run.
    fn stamp_pattern(&mut self, job: &mut ChunkJob) -> Option<PatternKind> {
        let site = job.site?;
        let needed = site.x0 + PATTERN_MIN_RUN as i32;
        let open = open_floor_runs(&job.chunk, PATTERN_MIN_RUN)
            .iter()
            .any(|&(start, len)| start <= site.x0 && needed <= start + len as i32);
        if !open {
            debug!(
                "pattern site at column {} of chunk {} is blocked",
                site.x0, job.chunk.index
            );
            return None;
        }

        if site.kind == PatternKind::SawGauntlet
            && self.stamp_saw_gauntlet(&mut job.chunk, site.x0)
        {
            return Some(PatternKind::SawGauntlet);
        }
        self.stamp_crusher_corridor(&mut job.chunk, site.x0)
            .then_some(PatternKind::CrusherCorridor)
    }

    /// Four ground saws four tiles apart, two safety platforms between
    /// them, and sometimes a saw mounted on the first platform.
    fn stamp_saw_gauntlet(&mut self, chunk: &mut Chunk, x0: i32) -> bool {
        let g = chunk.ground_level;
        let base_x = chunk.base_x();
        let saw_y = g - 1;
        let saws: Vec<i32> = (0..4).map(|k| x0 + k * MIN_OBSTACLE_SPACING).collect();

        let fits = saws.iter().all(|&lx| {
            chunk.get(lx, saw_y) == Tile::Empty
                && chunk.ground_tile(lx) == Tile::Floor
                && self.ledger.can_place(base_x + lx, None, MIN_OBSTACLE_SPACING)
        });
        if !fits {
            return false;
        }

        for &lx in &saws {
            chunk.set(lx, saw_y, Tile::Saw);
            self.ledger.record(base_x + lx, saw_y);
        }

        let platform_y = g - 4;
        for lx in (x0 + 1..=x0 + 3).chain(x0 + 9..=x0 + 11) {
            chunk.place(lx, platform_y, Tile::Platform);
        }

        let (bx, by) = (x0 + 2, platform_y - 1);
        if self.rng.0.gen_bool(GAUNTLET_BONUS_CHANCE)
            && chunk.get(bx, platform_y) == Tile::Platform
            && self.ledger.can_place(base_x + bx, Some(by), MIN_OBSTACLE_SPACING)
            && chunk.place(bx, by, Tile::Saw)
        {
            self.ledger.record(base_x + bx, by);
        }
        true
    }

    /// False ceiling across nine columns, two crushers hanging from it and
    /// a safety platform between them.
    fn stamp_crusher_corridor(&mut self, chunk: &mut Chunk, x0: i32) -> bool {
        let g = chunk.ground_level;
        let base_x = chunk.base_x();
        let ceiling_y = g - 6;
        let crusher_y = g - 5;
        let crushers = [x0 + 1, x0 + 7];

        if ceiling_y < 0 {
            return false;
        }
        let fits = crushers.iter().all(|&lx| {
            matches!(chunk.get(lx, ceiling_y), Tile::Empty | Tile::Platform)
                && chunk.get(lx, crusher_y) == Tile::Empty
                && clear_below(chunk, lx, crusher_y, CRUSHER_STRIKE_ROWS)
                && self.ledger.can_place(base_x + lx, None, MIN_OBSTACLE_SPACING)
        });
        if !fits {
            return false;
        }

        for lx in x0..x0 + PATTERN_MIN_RUN as i32 {
            chunk.place(lx, ceiling_y, Tile::Platform);
        }
        for &lx in &crushers {
            chunk.set(lx, crusher_y, Tile::Crusher);
            self.ledger.record(base_x + lx, crusher_y);
        }
        for lx in x0 + 3..=x0 + 5 {
            chunk.place(lx, g - 2, Tile::Platform);
        }
        true
    }
}

/* ===========================================================
   helpers
   =========================================================== */
#[inline]
fn finite_or_one(v: f64) -> f32 {
    if v.is_finite() {
        v as f32
    } else {
        1.0
    }
}

/// Terrain draw weights in `TerrainType::DRAWABLE` order.
pub fn terrain_weights(state: &DifficultyState) -> [u32; 6] {
    let mut weights = BASE_TERRAIN_WEIGHTS;
    if state.difficulty > 2.0 {
        weights[HAZARDOUS_IDX] += 10;
        weights[CHAOTIC_IDX] += 5;
    }
    if state.last_terrain == Some(TerrainType::Hazardous)
        && state.terrain_streak > MAX_HAZARDOUS_STREAK
    {
        weights[HAZARDOUS_IDX] = 0;
    }
    weights
}

struct PlatformLayout {
    count: RangeInclusive<u32>,
    rows_above: RangeInclusive<i32>,
    length: RangeInclusive<i32>,
}

impl PlatformLayout {
    fn for_terrain(terrain: TerrainType) -> Self {
        let (count, rows_above, length) = match terrain {
            TerrainType::Spawn => (1..=1, 3..=4, 3..=4),
            TerrainType::Normal => (1..=2, 3..=4, 3..=5),
            TerrainType::PlatformHeavy => (3..=5, 3..=5, 3..=6),
            TerrainType::Hazardous => (1..=2, 3..=4, 2..=4),
            TerrainType::Elevated => (2..=4, 5..=7, 4..=7),
            TerrainType::Valley => (1..=3, 2..=3, 4..=7),
            TerrainType::Chaotic => (1..=4, 2..=7, 2..=6),
        };
        Self { count, rows_above, length }
    }
}

fn near_gap(chunk: &Chunk, lx: i32) -> bool {
    chunk.ground_tile(lx - 1) == Tile::Gap || chunk.ground_tile(lx + 1) == Tile::Gap
}

/// empty cells directly left and right of (lx, y), at most 2 each way
fn horizontal_clearance(chunk: &Chunk, lx: i32, y: i32) -> usize {
    let left = (1..=2)
        .take_while(|d| lx - d >= 0 && chunk.get(lx - d, y) == Tile::Empty)
        .count();
    let right = (1..=2)
        .take_while(|d| lx + d < CHUNK_WIDTH as i32 && chunk.get(lx + d, y) == Tile::Empty)
        .count();
    left + right
}

fn clear_below(chunk: &Chunk, lx: i32, y: i32, rows: i32) -> bool {
    (1..=rows).all(|dy| y + dy < CHUNK_HEIGHT as i32 && chunk.get(lx, y + dy) == Tile::Empty)
}

/// platforms somewhere under the crusher row in both neighbouring columns
fn flanked_by_platforms(chunk: &Chunk, lx: i32, y: i32) -> bool {
    let has_platform =
        |x: i32| (y + 1..chunk.ground_level).any(|row| chunk.get(x, row) == Tile::Platform);
    has_platform(lx - 1) && has_platform(lx + 1)
}

/// (start, length) of floor runs with nothing on top, at least `min_len` long
fn open_floor_runs(chunk: &Chunk, min_len: usize) -> Vec<(i32, usize)> {
    let g = chunk.ground_level;
    let mut runs = Vec::new();
    let mut start = None;

    for lx in 0..=CHUNK_WIDTH as i32 {
        let open = lx < CHUNK_WIDTH as i32
            && chunk.get(lx, g) == Tile::Floor
            && chunk.get(lx, g - 1) == Tile::Empty;
        match (open, start) {
            (true, None) => start = Some(lx),
            (false, Some(s)) => {
                let len = (lx - s) as usize;
                if len >= min_len {
                    runs.push((s, len));
                }
                start = None;
            }
            _ => {}
        }
    }
    runs
}
