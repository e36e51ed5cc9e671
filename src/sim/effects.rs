//! Ephemeral visual feedback
//!
//! Rings, confetti and sparkles spawned as side effects of pickups, gate
//! attempts and the win celebration. Strictly decorative: nothing in the
//! gameplay code reads these back, so dropping the whole module would change
//! feedback richness and nothing else.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::Serialize;

/// Packed 0xRRGGBB colors used by the spawn helpers
pub mod colors {
    pub const TEN_GOLD: u32 = 0xb19020;
    pub const ONE_TEAL: u32 = 0x1a8a78;
    pub const SHARD_AMBER: u32 = 0xffc107;
    pub const SHARD_SPARK: u32 = 0xffe082;
    pub const TEN_SPARK: u32 = 0xfff1a8;
    pub const ONE_SPARK: u32 = 0xa5fff3;
    pub const MISS_RED: u32 = 0xff6b6b;
}

/// Confetti palette (random pick per piece)
const CONFETTI_PALETTE: [u32; 6] = [
    0xff5c7a, 0xffb347, 0xfff275, 0x6ee77a, 0x5cc8ff, 0xc58cff,
];

/// A short-lived feedback record
#[derive(Debug, Clone, Serialize)]
pub enum Effect {
    /// Expanding circle outline that fades out
    Ring {
        pos: Vec2,
        radius: f32,
        max_radius: f32,
        alpha: f32,
        color: u32,
    },
    /// Falling colored squares (win/gate celebration)
    Confetti {
        pos: Vec2,
        vel: Vec2,
        life: f32,
        color: u32,
    },
    /// Small drifting points of light
    Sparkle {
        pos: Vec2,
        vel: Vec2,
        life: f32,
        color: u32,
    },
}

impl Effect {
    /// Advance by dt seconds; returns false once the effect should retire
    fn advance(&mut self, dt: f32) -> bool {
        match self {
            Effect::Ring {
                radius,
                max_radius,
                alpha,
                ..
            } => {
                *radius += 84.0 * dt;
                *alpha -= 1.2 * dt;
                *radius < *max_radius && *alpha > 0.0
            }
            Effect::Confetti { pos, vel, life, .. } => {
                *pos += *vel * dt;
                vel.y += 108.0 * dt;
                *life -= dt;
                *life > 0.0
            }
            Effect::Sparkle { pos, vel, life, .. } => {
                *pos += *vel * dt;
                vel.y += 72.0 * dt;
                *life -= dt;
                *life > 0.0
            }
        }
    }
}

/// Advance all effects and drop the expired ones
pub fn advance_effects(effects: &mut Vec<Effect>, dt: f32) {
    effects.retain_mut(|e| e.advance(dt));
}

pub fn spawn_ring(effects: &mut Vec<Effect>, pos: Vec2, color: u32) {
    effects.push(Effect::Ring {
        pos,
        radius: 2.0,
        max_radius: 32.0,
        alpha: 1.0,
        color,
    });
}

/// Celebration burst of 60 pieces around a point
pub fn spawn_confetti(effects: &mut Vec<Effect>, rng: &mut Pcg32, pos: Vec2) {
    for _ in 0..60 {
        let offset = Vec2::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
        effects.push(Effect::Confetti {
            pos: pos + offset,
            vel: Vec2::new(
                rng.random_range(-108.0..108.0),
                rng.random_range(-132.0..-36.0),
            ),
            life: rng.random_range(1.2..2.2),
            color: CONFETTI_PALETTE[rng.random_range(0..CONFETTI_PALETTE.len())],
        });
    }
}

pub fn spawn_sparkles(effects: &mut Vec<Effect>, rng: &mut Pcg32, pos: Vec2, color: u32) {
    for _ in 0..10 {
        effects.push(Effect::Sparkle {
            pos,
            vel: Vec2::new(rng.random_range(-30.0..30.0), rng.random_range(-60.0..-12.0)),
            life: rng.random_range(0.33..0.58),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_ring_expands_then_retires() {
        let mut effects = Vec::new();
        spawn_ring(&mut effects, Vec2::ZERO, colors::TEN_GOLD);

        advance_effects(&mut effects, 0.1);
        assert_eq!(effects.len(), 1);
        let Effect::Ring { radius, alpha, .. } = &effects[0] else {
            panic!("expected ring");
        };
        assert!(*radius > 2.0);
        assert!(*alpha < 1.0);

        // A full second is past both the radius and alpha limits
        advance_effects(&mut effects, 1.0);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_confetti_burst_retires_completely() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut effects = Vec::new();
        spawn_confetti(&mut effects, &mut rng, Vec2::new(100.0, 100.0));
        assert_eq!(effects.len(), 60);

        // Max life is 2.2s
        for _ in 0..150 {
            advance_effects(&mut effects, 1.0 / 60.0);
        }
        assert!(effects.is_empty());
    }

    #[test]
    fn test_sparkles_fall_under_gravity() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut effects = Vec::new();
        spawn_sparkles(&mut effects, &mut rng, Vec2::ZERO, colors::ONE_SPARK);

        let before: Vec<f32> = effects
            .iter()
            .map(|e| match e {
                Effect::Sparkle { vel, .. } => vel.y,
                _ => panic!("expected sparkle"),
            })
            .collect();
        advance_effects(&mut effects, 0.1);
        for (e, vy0) in effects.iter().zip(before) {
            let Effect::Sparkle { vel, .. } = e else {
                panic!("expected sparkle");
            };
            assert!(vel.y > vy0);
        }
    }
}
