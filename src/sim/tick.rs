//! Per-tick simulation update
//!
//! Variable-timestep: the host passes the elapsed seconds since the previous
//! frame (clamped). Discrete actions (gate attempts, drops) arrive as one-shot
//! flags on `TickInput` and are cleared by the host after the tick.

use glam::Vec2;
use rand::Rng;

use super::camera::camera_for;
use super::effects::{advance_effects, colors, spawn_confetti, spawn_ring, spawn_sparkles};
use super::state::{GameEvent, GameState, Item, ItemKind};
use crate::consts::*;
use crate::{clamp_to_world, dist};

/// Input intents for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Normalized (or zero) movement direction
    pub dir: Vec2,
    /// Try the nearest gate (one-shot)
    pub attempt_gate: bool,
    /// Drop a 1-stone (one-shot)
    pub drop_one: bool,
    /// Drop a 10-stick (one-shot)
    pub drop_ten: bool,
    /// Toggle the help overlay (one-shot)
    pub toggle_help: bool,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.time += dt as f64;

    if input.toggle_help {
        state.show_help = !state.show_help;
    }

    // Discrete actions before movement, so drops land at the pre-move facing
    if input.attempt_gate {
        attempt_gate(state);
    }
    if input.drop_one {
        drop_item(state, ItemKind::One);
    }
    if input.drop_ten {
        drop_item(state, ItemKind::Ten);
    }

    // Movement: facing only updates while a direction is held
    let moving = input.dir != Vec2::ZERO;
    if moving {
        let dir = input.dir.normalize();
        state.player.vel = dir * state.player.speed;
        state.player.facing = dir.y.atan2(dir.x);
        state.events.push(GameEvent::Footstep {
            on_land: state.world.is_land(state.player.pos),
        });
    } else {
        // Frame-rate independent glide to a stop
        state.player.vel *= 0.7_f32.powf(dt * 60.0);
    }

    let next = state.player.pos + state.player.vel * dt;
    state.player.pos = clamp_to_world(next, state.world.width, state.world.height, WORLD_MARGIN);
    state.camera = camera_for(state.player.pos);

    collect_items(state);
    npc_hints(state);
    collect_shards(state);

    // Win transition fires exactly once per session
    if !state.won && state.solved >= PUZZLES_TO_SOLVE {
        state.won = true;
        state.events.push(GameEvent::Won);
        let pos = state.player.pos;
        spawn_confetti(&mut state.effects, &mut state.rng, pos);
    }

    // Age the currently-displayed message
    if let Some(front) = state.messages.first_mut() {
        front.remaining -= dt as f64;
        if front.remaining <= 0.0 {
            state.messages.remove(0);
        }
    }

    advance_effects(&mut state.effects, dt);
}

fn collect_items(state: &mut GameState) {
    let now = state.time;
    let player_pos = state.player.pos;
    let mut picked: Vec<(Vec2, ItemKind)> = Vec::new();

    for item in &mut state.world.items {
        if item.available(now) && dist(player_pos, item.pos) < PICKUP_RADIUS {
            item.picked = true;
            picked.push((item.pos, item.kind));
        }
    }

    for (pos, kind) in picked {
        match kind {
            ItemKind::Ten => state.player.tens += 1,
            ItemKind::One => state.player.ones += 1,
        }
        state.events.push(GameEvent::ItemPicked(kind));
        let (ring, spark) = match kind {
            ItemKind::Ten => (colors::TEN_GOLD, colors::TEN_SPARK),
            ItemKind::One => (colors::ONE_TEAL, colors::ONE_SPARK),
        };
        spawn_ring(&mut state.effects, pos, ring);
        spawn_sparkles(&mut state.effects, &mut state.rng, pos, spark);
    }
}

fn npc_hints(state: &mut GameState) {
    if state.time - state.last_hint_time < NPC_HINT_COOLDOWN_SECS {
        return;
    }
    let player_pos = state.player.pos;
    let Some(npc) = state
        .world
        .npcs
        .iter()
        .find(|n| dist(player_pos, n.pos) < n.talk_radius)
    else {
        return;
    };
    let (name, hint) = (npc.name, npc.hint);
    state.last_hint_time = state.time;
    state.enqueue_message(hint, 5.0);
    state.events.push(GameEvent::NpcHint { name, hint });
}

fn collect_shards(state: &mut GameState) {
    let player_pos = state.player.pos;
    let mut collected: Vec<Vec2> = Vec::new();

    for shard in &mut state.world.shards {
        if shard.collected || dist(player_pos, shard.pos) >= PICKUP_RADIUS {
            continue;
        }
        let owner_open = state
            .world
            .gates
            .iter()
            .any(|g| g.id == shard.gate_id && g.open);
        if owner_open {
            shard.collected = true;
            collected.push(shard.pos);
        }
    }

    for pos in collected {
        state.events.push(GameEvent::ShardCollected);
        spawn_ring(&mut state.effects, pos, colors::SHARD_AMBER);
        spawn_sparkles(&mut state.effects, &mut state.rng, pos, colors::SHARD_SPARK);
        state.enqueue_message("Star Shard collected! Keep exploring.", 3.0);
    }
}

/// Try the nearest unopened gate within interaction range.
///
/// An exact inventory match opens the gate irreversibly; a mismatch surfaces
/// a place-value hint. Inventory is never mutated here.
fn attempt_gate(state: &mut GameState) {
    let player_pos = state.player.pos;
    let nearest = state
        .world
        .gates
        .iter_mut()
        .filter(|g| !g.open)
        .map(|g| (dist(player_pos, g.pos), g))
        .filter(|(d, _)| *d < GATE_RADIUS)
        .min_by(|(a, _), (b, _)| a.total_cmp(b));

    let Some((_, gate)) = nearest else {
        state.enqueue_message("No gate nearby. Find a stone totem and stand close.", 2.0);
        state.events.push(GameEvent::NoGateNearby);
        return;
    };

    let total = state.player.total();
    let target = gate.target;
    if total == target {
        gate.open = true;
        let gate_pos = gate.pos;
        state.solved += 1;
        let (tens, ones) = (state.player.tens, state.player.ones);
        state.enqueue_message(
            format!("Gate opened! Great match: {tens} tens + {ones} ones = {target}"),
            4.5,
        );
        state.events.push(GameEvent::GateOpened { target, tens, ones });
        spawn_confetti(&mut state.effects, &mut state.rng, gate_pos);
    } else {
        let gate_pos = gate.pos;
        let diff = target as i32 - total as i32;
        if diff > 0 {
            let (need_tens, need_ones) = (diff / 10, diff % 10);
            state.enqueue_message(
                format!("Need {diff} more. Tip: {need_tens} tens and {need_ones} ones would make it."),
                4.5,
            );
        } else {
            state.enqueue_message(
                format!("Too many by {}. Drop some items (Q drops 1, E drops 10).", -diff),
                4.5,
            );
        }
        state.events.push(GameEvent::GateMismatch { diff });
        spawn_ring(&mut state.effects, gate_pos, colors::MISS_RED);
    }
}

/// Drop one unit of `kind` in front of the player.
///
/// The only place items are created after world generation. The new item is
/// pickup-suppressed briefly so the dropper cannot instantly re-collect it.
fn drop_item(state: &mut GameState, kind: ItemKind) {
    let count = match kind {
        ItemKind::Ten => &mut state.player.tens,
        ItemKind::One => &mut state.player.ones,
    };
    if *count == 0 {
        state.enqueue_message(format!("No {}s to drop.", kind.noun()), 1.5);
        state.events.push(GameEvent::DropRefused(kind));
        return;
    }
    *count -= 1;

    let offset = Vec2::from_angle(state.player.facing) * DROP_DISTANCE;
    let pos = clamp_to_world(
        state.player.pos + offset,
        state.world.width,
        state.world.height,
        DROP_MARGIN,
    );
    let wobble = state.rng.random_range(0.0..std::f32::consts::TAU);
    state.world.items.push(Item {
        pos,
        kind,
        picked: false,
        pickup_suppressed_until: Some(state.time + DROP_SUPPRESS_SECS),
        wobble,
    });

    let ring = match kind {
        ItemKind::Ten => colors::TEN_GOLD,
        ItemKind::One => colors::ONE_TEAL,
    };
    spawn_ring(&mut state.effects, pos, ring);
    state.events.push(GameEvent::ItemDropped(kind));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    /// A state with a known gate right next to the player and no stray items
    /// underfoot
    fn state_with_gate(target: u32, tens: u32, ones: u32) -> GameState {
        let mut state = GameState::new(12345);
        state.world.items.clear();
        state.world.npcs.clear();
        state.player.pos = Vec2::new(700.0, 500.0);
        // Park the other gates out of interaction range
        for (i, gate) in state.world.gates.iter_mut().enumerate() {
            gate.pos = Vec2::new(100.0 + 100.0 * i as f32, 100.0);
        }
        state.world.gates[0].pos = state.player.pos + Vec2::new(20.0, 0.0);
        state.world.gates[0].target = target;
        state.player.tens = tens;
        state.player.ones = ones;
        state.drain_events();
        state
    }

    #[test]
    fn test_exact_match_opens_gate_without_spending_inventory() {
        let mut state = state_with_gate(15, 1, 5);
        let input = TickInput {
            attempt_gate: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert!(state.world.gates[0].open);
        assert_eq!(state.solved, 1);
        // Counters are matched, not spent
        assert_eq!(state.player.tens, 1);
        assert_eq!(state.player.ones, 5);
        assert!(state.drain_events().contains(&GameEvent::GateOpened {
            target: 15,
            tens: 1,
            ones: 5
        }));
    }

    #[test]
    fn test_shortfall_hint_decomposes_remainder() {
        let mut state = state_with_gate(20, 0, 3);
        let input = TickInput {
            attempt_gate: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert!(!state.world.gates[0].open);
        assert_eq!(state.solved, 0);
        assert_eq!(state.player.ones, 3);
        assert!(state
            .drain_events()
            .contains(&GameEvent::GateMismatch { diff: 17 }));
        let text = &state.messages.last().unwrap().text;
        assert!(text.contains("Need 17 more"));
        assert!(text.contains("1 tens and 7 ones"));
    }

    #[test]
    fn test_overshoot_hint_suggests_dropping() {
        let mut state = state_with_gate(14, 2, 0);
        let input = TickInput {
            attempt_gate: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert!(!state.world.gates[0].open);
        assert!(state
            .drain_events()
            .contains(&GameEvent::GateMismatch { diff: -6 }));
        assert!(state.messages.last().unwrap().text.contains("Too many by 6"));
    }

    #[test]
    fn test_attempt_with_no_gate_in_range() {
        let mut state = state_with_gate(15, 1, 5);
        state.world.gates[0].pos = state.player.pos + Vec2::new(500.0, 0.0);
        let input = TickInput {
            attempt_gate: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert!(state.drain_events().contains(&GameEvent::NoGateNearby));
        assert_eq!(state.solved, 0);
    }

    #[test]
    fn test_gate_open_is_monotonic() {
        let mut state = state_with_gate(15, 1, 5);
        let attempt = TickInput {
            attempt_gate: true,
            ..Default::default()
        };
        tick(&mut state, &attempt, DT);
        assert!(state.world.gates[0].open);

        // Mismatching attempts afterwards must not close it
        state.player.ones = 9;
        for _ in 0..5 {
            tick(&mut state, &attempt, DT);
            assert!(state.world.gates[0].open);
        }
        assert_eq!(state.solved, 1);
    }

    #[test]
    fn test_drop_with_empty_counter_is_a_noop() {
        let mut state = state_with_gate(15, 0, 0);
        let items_before = state.world.items.len();
        let input = TickInput {
            drop_ten: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert_eq!(state.player.tens, 0);
        assert_eq!(state.world.items.len(), items_before);
        assert!(state
            .drain_events()
            .contains(&GameEvent::DropRefused(ItemKind::Ten)));
        assert!(!state.messages.is_empty());
    }

    #[test]
    fn test_dropped_item_is_pickup_suppressed() {
        let mut state = state_with_gate(15, 1, 5);
        let input = TickInput {
            drop_one: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.player.ones, 4);
        let dropped_pos = state.world.items.last().unwrap().pos;

        // Stand directly on the drop: still cannot re-collect inside the window
        state.player.pos = dropped_pos;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.player.ones, 4);
        assert!(!state.world.items.last().unwrap().picked);

        // Past the window it is collectible again
        for _ in 0..40 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.player.ones, 5);
        assert!(state.world.items.last().unwrap().picked);
    }

    #[test]
    fn test_win_fires_exactly_once() {
        let mut state = state_with_gate(15, 1, 5);
        state.solved = PUZZLES_TO_SOLVE - 1;
        let attempt = TickInput {
            attempt_gate: true,
            ..Default::default()
        };
        tick(&mut state, &attempt, DT);
        assert!(state.won);
        let won_count = state
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::Won)
            .count();
        assert_eq!(won_count, 1);

        // Extra ticks and solves never re-fire the transition
        state.solved += 1;
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(!state.drain_events().contains(&GameEvent::Won));
    }

    #[test]
    fn test_npc_hint_cooldown() {
        let mut state = GameState::new(9);
        state.world.items.clear();
        state.player.pos = state.world.npcs[0].pos;
        tick(&mut state, &TickInput::default(), DT);
        let hints = |evs: &[GameEvent]| {
            evs.iter()
                .filter(|e| matches!(e, GameEvent::NpcHint { .. }))
                .count()
        };
        assert_eq!(hints(&state.drain_events()), 1);

        // Standing still next to the NPC: no re-trigger within the cooldown
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(hints(&state.drain_events()), 0);

        // After the cooldown elapses, the hint fires again
        for _ in 0..300 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(hints(&state.drain_events()), 1);
    }

    #[test]
    fn test_shard_requires_open_gate() {
        let mut state = state_with_gate(15, 1, 5);
        let shard_pos = state.world.shards[0].pos;
        state.player.pos = shard_pos;

        tick(&mut state, &TickInput::default(), DT);
        assert!(!state.world.shards[0].collected);

        state.world.gates[0].open = true;
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.world.shards[0].collected);
        assert!(state.drain_events().contains(&GameEvent::ShardCollected));
    }

    #[test]
    fn test_facing_held_while_idle() {
        let mut state = state_with_gate(15, 1, 5);
        let up = TickInput {
            dir: Vec2::new(0.0, -1.0),
            ..Default::default()
        };
        tick(&mut state, &up, DT);
        let facing = state.player.facing;

        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.player.facing, facing);
    }

    proptest! {
        /// Player and camera stay clamped for any input direction and dt
        #[test]
        fn prop_position_and_camera_clamped(
            seed in any::<u64>(),
            steps in proptest::collection::vec((-1.0_f32..1.0, -1.0_f32..1.0, 0.0_f32..0.2), 1..80),
        ) {
            let mut state = GameState::new(seed);
            for (dx, dy, dt) in steps {
                let input = TickInput { dir: Vec2::new(dx, dy), ..Default::default() };
                tick(&mut state, &input, dt);

                prop_assert!(state.player.pos.x >= WORLD_MARGIN);
                prop_assert!(state.player.pos.x <= WORLD_WIDTH - WORLD_MARGIN);
                prop_assert!(state.player.pos.y >= WORLD_MARGIN);
                prop_assert!(state.player.pos.y <= WORLD_HEIGHT - WORLD_MARGIN);
                prop_assert!(state.camera.x >= 0.0 && state.camera.x <= WORLD_WIDTH - VIEW_WIDTH);
                prop_assert!(state.camera.y >= 0.0 && state.camera.y <= WORLD_HEIGHT - VIEW_HEIGHT);
            }
        }

        /// Any mix of drops and attempts keeps the inventory consistent:
        /// drops are refused at zero rather than underflowing
        #[test]
        fn prop_inventory_never_underflows(
            seed in any::<u64>(),
            actions in proptest::collection::vec(0_u8..3, 1..120),
        ) {
            let mut state = GameState::new(seed);
            for a in actions {
                let input = TickInput {
                    drop_one: a == 0,
                    drop_ten: a == 1,
                    attempt_gate: a == 2,
                    ..Default::default()
                };
                tick(&mut state, &input, 1.0 / 60.0);
            }
            // u32 counters cannot go negative; the real check is that the
            // guarded drops never panicked and totals stay self-consistent
            prop_assert_eq!(state.player.total(), state.player.tens * 10 + state.player.ones);
        }
    }
}
