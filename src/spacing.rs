//! minimum-distance bookkeeping for placed obstacles
//!
//! Positions are world tile coordinates. Ground-attached hazards use a
//! 1-D test on X; elevated hazards (platform spikes, mounted saws) use the
//! Euclidean distance. Whatever the caller asks for, the enforced minimum
//! is never below `MIN_OBSTACLE_SPACING`.

use crate::constants::MIN_OBSTACLE_SPACING;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstaclePos {
    pub x: i32,
    pub y: i32,
}

impl ObstaclePos {
    #[inline]
    fn dist_sq(self, x: i32, y: i32) -> i64 {
        let dx = (self.x - x) as i64;
        let dy = (self.y - y) as i64;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpacingLedger {
    positions: Vec<ObstaclePos>,
    last_spike_x: Option<i32>,
    last_platform_spike: Option<ObstaclePos>,
}

#[inline]
fn effective(min_distance: i32) -> i32 {
    min_distance.max(MIN_OBSTACLE_SPACING)
}

impl SpacingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Can an obstacle go at `x` (and, for elevated checks, `y`)?
    pub fn can_place(&self, x: i32, y: Option<i32>, min_distance: i32) -> bool {
        let min = effective(min_distance);
        match y {
            None => {
                if self.last_spike_x.is_some_and(|sx| (sx - x).abs() < min) {
                    return false;
                }
                self.positions.iter().all(|p| (p.x - x).abs() >= min)
            }
            Some(y) => {
                let min_sq = (min as i64) * (min as i64);
                if self.last_platform_spike.is_some_and(|p| p.dist_sq(x, y) < min_sq) {
                    return false;
                }
                self.positions.iter().all(|p| p.dist_sq(x, y) >= min_sq)
            }
        }
    }

    pub fn record(&mut self, x: i32, y: i32) {
        self.positions.push(ObstaclePos { x, y });
    }

    /// record a spike sitting on the ground line
    pub fn record_ground_spike(&mut self, x: i32, y: i32) {
        self.record(x, y);
        self.last_spike_x = Some(x);
    }

    /// record a spike sitting on a platform
    pub fn record_platform_spike(&mut self, x: i32, y: i32) {
        self.record(x, y);
        self.last_platform_spike = Some(ObstaclePos { x, y });
    }

    /// Drop every entry left of `min_x`. Returns how many were dropped.
    pub fn prune_before(&mut self, min_x: i32) -> usize {
        let before = self.positions.len();
        self.positions.retain(|p| p.x >= min_x);
        if self.last_spike_x.is_some_and(|x| x < min_x) {
            self.last_spike_x = None;
        }
        if self.last_platform_spike.is_some_and(|p| p.x < min_x) {
            self.last_platform_spike = None;
        }
        before - self.positions.len()
    }

    pub fn positions(&self) -> &[ObstaclePos] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.last_spike_x = None;
        self.last_platform_spike = None;
    }
}
