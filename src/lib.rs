//! Tens & Trails - an open-world place-value math game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world, entities, puzzle gates)
//! - `audio`: Web Audio synthesis engine (one-shots, groove, ambience)
//! - `input`: Key state to movement vector / discrete action mapping
//! - `snapshot`: Read-only per-frame view for the rendering collaborator
//! - `settings`: Persisted player preferences

pub mod audio;
pub mod input;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// World extent in pixels
    pub const WORLD_WIDTH: f32 = 1440.0;
    pub const WORLD_HEIGHT: f32 = 960.0;

    /// Viewport (canvas) extent
    pub const VIEW_WIDTH: f32 = 720.0;
    pub const VIEW_HEIGHT: f32 = 480.0;

    /// Player walks at this many pixels per second
    pub const PLAYER_SPEED: f32 = 120.0;
    /// Player cannot leave [WORLD_MARGIN, world - WORLD_MARGIN]
    pub const WORLD_MARGIN: f32 = 20.0;

    /// Items are collected within this distance of the player
    pub const PICKUP_RADIUS: f32 = 18.0;
    /// Gates respond to attempts within this distance
    pub const GATE_RADIUS: f32 = 36.0;
    /// Dropped items land this far along the facing angle (outside
    /// PICKUP_RADIUS so they are not instantly re-collected)
    pub const DROP_DISTANCE: f32 = 28.0;
    /// Dropped items cannot be re-picked for this long (seconds)
    pub const DROP_SUPPRESS_SECS: f64 = 0.5;
    /// Dropped items are clamped to [DROP_MARGIN, world - DROP_MARGIN]
    pub const DROP_MARGIN: f32 = 10.0;

    /// Minimum seconds between NPC hint messages
    pub const NPC_HINT_COOLDOWN_SECS: f64 = 5.0;

    /// Gates to open before the session is won
    pub const PUZZLES_TO_SOLVE: u32 = 3;
    /// Gate targets are drawn from this inclusive range
    pub const GATE_TARGET_MIN: u32 = 14;
    pub const GATE_TARGET_MAX: u32 = 59;

    /// Initial collectible population
    pub const TENS_COUNT: usize = 18;
    pub const ONES_COUNT: usize = 50;

    /// Longest timestep a single frame may simulate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Euclidean distance between two points
#[inline]
pub fn dist(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Clamp a point to a rectangle inset by `margin` on all sides
#[inline]
pub fn clamp_to_world(p: Vec2, width: f32, height: f32, margin: f32) -> Vec2 {
    Vec2::new(
        p.x.clamp(margin, width - margin),
        p.y.clamp(margin, height - margin),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_world() {
        let p = clamp_to_world(Vec2::new(-50.0, 2000.0), 1440.0, 960.0, 20.0);
        assert_eq!(p, Vec2::new(20.0, 940.0));

        let inside = Vec2::new(300.0, 300.0);
        assert_eq!(clamp_to_world(inside, 1440.0, 960.0, 20.0), inside);
    }
}
