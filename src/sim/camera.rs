//! World-to-viewport mapping
//!
//! The camera is a pure function of the player position and the world and
//! viewport extents: centered on the player, clamped so the view never shows
//! past a world edge.

use glam::Vec2;

use crate::consts::{VIEW_HEIGHT, VIEW_WIDTH, WORLD_HEIGHT, WORLD_WIDTH};

/// Top-left corner of the viewport in world coordinates
pub fn camera_for(player_pos: Vec2) -> Vec2 {
    Vec2::new(
        (player_pos.x - VIEW_WIDTH / 2.0).clamp(0.0, WORLD_WIDTH - VIEW_WIDTH),
        (player_pos.y - VIEW_HEIGHT / 2.0).clamp(0.0, WORLD_HEIGHT - VIEW_HEIGHT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_centered_in_open_water() {
        let cam = camera_for(Vec2::new(720.0, 480.0));
        assert_eq!(cam, Vec2::new(360.0, 240.0));
    }

    #[test]
    fn test_camera_clamped_at_origin_corner() {
        let cam = camera_for(Vec2::new(50.0, 50.0));
        assert_eq!(cam, Vec2::ZERO);
    }

    #[test]
    fn test_camera_clamped_at_far_corner() {
        let cam = camera_for(Vec2::new(WORLD_WIDTH, WORLD_HEIGHT));
        assert_eq!(
            cam,
            Vec2::new(WORLD_WIDTH - VIEW_WIDTH, WORLD_HEIGHT - VIEW_HEIGHT)
        );
    }
}
