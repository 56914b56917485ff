use bevy::prelude::*;

/// pixel snapping helper – keeps the camera on whole pixels so tile queries
/// made from it never land on half‑pixels between frames
#[inline]
fn snap(v: f32) -> f32 {
    v.round()
}

/// headless stand‑in for the game camera: scrolls right at a fixed speed
///
/// NOTE: `x` is the camera *centre* in pixels; the world only ever reads
/// the snapped value.
#[derive(Resource, Clone, Copy, Debug)]
pub struct RunnerCamera {
    pub x: f32,
    /// pixels per second
    pub speed: f32,
}

impl Default for RunnerCamera {
    fn default() -> Self {
        Self { x: 0.0, speed: 320.0 }
    }
}

impl RunnerCamera {
    pub fn pixel_x(&self) -> f32 {
        snap(self.x)
    }
}

/// advance the camera; a non‑finite speed or delta stalls it for the frame
pub fn auto_scroll_system(time: Res<Time>, mut camera: ResMut<RunnerCamera>) {
    let step = camera.speed * time.delta_secs();
    if step.is_finite() {
        camera.x += step;
    }
}
