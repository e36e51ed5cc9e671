//! World generation
//!
//! Runs once per session (and again on explicit reset). Everything here
//! draws from the state-owned RNG, so a given seed always produces the same
//! world.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::state::{Gate, GameState, Item, ItemKind, Lump, Npc, Shard};
use crate::consts::*;

/// Candidate gate locations; a shuffled subset is used each session
const GATE_SPOTS: [(f32, f32); 5] = [
    (260.0, 780.0),
    (1050.0, 300.0),
    (1100.0, 820.0),
    (700.0, 520.0),
    (400.0, 420.0),
];

/// Attempts at landing an item on an island before giving up and placing it
/// anywhere (some seeds produce sparse clusters)
const LAND_SAMPLE_ATTEMPTS: usize = 200;

/// Populate (or repopulate) the world and reset session progress
pub fn generate_world(state: &mut GameState) {
    let world = &mut state.world;
    world.islands.clear();
    world.items.clear();
    world.gates.clear();
    world.npcs.clear();
    world.shards.clear();

    // Islands as clumped circles
    for _ in 0..6 {
        let cx = state.rng.random_range(200.0..world.width - 200.0);
        let cy = state.rng.random_range(200.0..world.height - 200.0);
        let lumps = state.rng.random_range(4..=8);
        let base_hue = state.rng.random_range(85..=135);
        let cluster: Vec<Lump> = (0..lumps)
            .map(|_| Lump {
                center: Vec2::new(
                    cx + state.rng.random_range(-120.0..120.0),
                    cy + state.rng.random_range(-80.0..80.0),
                ),
                radius: state.rng.random_range(60.0..130.0),
                hue: base_hue + state.rng.random_range(-10..=10),
            })
            .collect();
        world.islands.push(cluster);
    }

    // Gates and their shards
    let mut spots = GATE_SPOTS;
    spots.shuffle(&mut state.rng);
    for (i, &(x, y)) in spots.iter().take(PUZZLES_TO_SOLVE as usize).enumerate() {
        let id = i as u32;
        world.gates.push(Gate {
            id,
            pos: Vec2::new(x, y),
            target: state.rng.random_range(GATE_TARGET_MIN..=GATE_TARGET_MAX),
            open: false,
        });
        world.shards.push(Shard {
            pos: Vec2::new(
                x + state.rng.random_range(-30.0..30.0),
                y + state.rng.random_range(-30.0..30.0),
            ),
            collected: false,
            gate_id: id,
        });
    }

    // NPCs
    world.npcs.push(Npc {
        pos: state.player.pos + Vec2::new(80.0, -20.0),
        name: "Maple the Mapcat",
        hint: "Psst! Gates open when your tens and ones add to the gate number. \
               Collect 10-sticks and 1-stones!",
        talk_radius: 80.0,
    });
    world.npcs.push(Npc {
        pos: Vec2::new(world.width - 200.0, 180.0),
        name: "Bloop the Bubble Whale",
        hint: "Bubble tip: Press Q to drop a 1, E to drop a 10. \
               Space to try a gate. M to mute.",
        talk_radius: 80.0,
    });

    // Collectibles, rejection-sampled onto land
    for _ in 0..TENS_COUNT {
        let pos = random_land_point(state);
        push_item(state, pos, ItemKind::Ten);
    }
    for _ in 0..ONES_COUNT {
        let pos = random_land_point(state);
        push_item(state, pos, ItemKind::One);
    }

    // Spawn at the centroid of the first cluster
    if let Some(first) = state.world.islands.first() {
        let sum: Vec2 = first.iter().map(|l| l.center).sum();
        state.player.pos = sum / first.len() as f32;
    }

    // Session progress and a starter inventory
    state.player.tens = 1;
    state.player.ones = 5;
    state.player.vel = Vec2::ZERO;
    state.solved = 0;
    state.won = false;
    state.show_help = true;
    state.last_hint_time = f64::NEG_INFINITY;
    state.messages.clear();
    state.effects.clear();
    state.camera = super::camera::camera_for(state.player.pos);

    state.enqueue_message(
        "Welcome, explorer! Use arrows or WASD to move. Space to try a gate. \
         Q/E to drop 1/10. H for help.",
        4.0,
    );

    log::info!(
        "World generated: seed {}, {} gates, {} items",
        state.seed,
        state.world.gates.len(),
        state.world.items.len()
    );
}

fn push_item(state: &mut GameState, pos: Vec2, kind: ItemKind) {
    let wobble = state.rng.random_range(0.0..std::f32::consts::TAU);
    state.world.items.push(Item {
        pos,
        kind,
        picked: false,
        pickup_suppressed_until: None,
        wobble,
    });
}

/// Rejection-sample a point on land, falling back to open water after a
/// bounded number of attempts
fn random_land_point(state: &mut GameState) -> Vec2 {
    let (w, h) = (state.world.width, state.world.height);
    for _ in 0..LAND_SAMPLE_ATTEMPTS {
        let p = Vec2::new(
            state.rng.random_range(60.0..w - 60.0),
            state.rng.random_range(60.0..h - 60.0),
        );
        if state.world.is_land(p) {
            return p;
        }
    }
    Vec2::new(
        state.rng.random_range(60.0..w - 60.0),
        state.rng.random_range(60.0..h - 60.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_counts() {
        let state = GameState::new(42);
        assert_eq!(state.world.islands.len(), 6);
        assert_eq!(state.world.gates.len(), PUZZLES_TO_SOLVE as usize);
        assert_eq!(state.world.shards.len(), PUZZLES_TO_SOLVE as usize);
        assert_eq!(state.world.npcs.len(), 2);
        assert_eq!(state.world.items.len(), TENS_COUNT + ONES_COUNT);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = GameState::new(1234);
        let b = GameState::new(1234);
        assert_eq!(a.player.pos, b.player.pos);
        for (ga, gb) in a.world.gates.iter().zip(&b.world.gates) {
            assert_eq!(ga.pos, gb.pos);
            assert_eq!(ga.target, gb.target);
        }
        for (ia, ib) in a.world.items.iter().zip(&b.world.items) {
            assert_eq!(ia.pos, ib.pos);
            assert_eq!(ia.kind, ib.kind);
        }
    }

    #[test]
    fn test_gate_targets_in_range() {
        for seed in [1_u64, 99, 4321, 777_777] {
            let state = GameState::new(seed);
            for gate in &state.world.gates {
                assert!((GATE_TARGET_MIN..=GATE_TARGET_MAX).contains(&gate.target));
                assert!(!gate.open);
            }
        }
    }

    #[test]
    fn test_every_shard_has_an_owning_gate() {
        let state = GameState::new(7);
        for shard in &state.world.shards {
            assert!(state.world.gates.iter().any(|g| g.id == shard.gate_id));
            assert!(crate::dist(shard.pos, state.world.gates[shard.gate_id as usize].pos) < 50.0);
        }
    }

    #[test]
    fn test_starting_inventory() {
        let state = GameState::new(5);
        assert_eq!(state.player.tens, 1);
        assert_eq!(state.player.ones, 5);
        assert_eq!(state.player.total(), 15);
    }
}
