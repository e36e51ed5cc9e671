//! Read-only view of the game state for rendering
//!
//! The renderer is an external collaborator; it consumes this snapshot plus
//! the HUD digest and never touches `GameState` directly.

use glam::Vec2;
use serde::Serialize;

use crate::consts::PUZZLES_TO_SOLVE;
use crate::sim::state::{GameState, ItemKind};
use crate::sim::Effect;

/// One drawable item
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub pos: Vec2,
    pub kind: ItemKind,
    /// Bob phase offset so items do not wobble in unison
    pub wobble: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GateView {
    pub pos: Vec2,
    pub target: u32,
    pub open: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NpcView {
    pub pos: Vec2,
    pub name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LumpView {
    pub center: Vec2,
    pub radius: f32,
    pub hue: i32,
}

/// Everything the renderer needs for one frame, in world coordinates
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub camera: Vec2,
    pub time: f64,
    pub player_pos: Vec2,
    pub player_facing: f32,
    pub islands: Vec<Vec<LumpView>>,
    pub items: Vec<ItemView>,
    pub gates: Vec<GateView>,
    pub npcs: Vec<NpcView>,
    pub shards: Vec<Vec2>,
    pub effects: Vec<Effect>,
}

/// Scoreboard/overlay digest for the DOM HUD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudState {
    pub tens: u32,
    pub ones: u32,
    pub total: u32,
    pub solved: u32,
    pub goal: u32,
    pub muted: bool,
    pub show_help: bool,
    pub won: bool,
    /// Currently-displayed message, if any
    pub message: Option<String>,
}

impl RenderSnapshot {
    /// With `reduced_motion` set, confetti and sparkle bursts are filtered
    /// out; rings stay because they mark where something happened
    pub fn capture(state: &GameState, reduced_motion: bool) -> Self {
        Self {
            camera: state.camera,
            time: state.time,
            player_pos: state.player.pos,
            player_facing: state.player.facing,
            islands: state
                .world
                .islands
                .iter()
                .map(|cluster| {
                    cluster
                        .iter()
                        .map(|l| LumpView {
                            center: l.center,
                            radius: l.radius,
                            hue: l.hue,
                        })
                        .collect()
                })
                .collect(),
            items: state
                .world
                .items
                .iter()
                .filter(|i| !i.picked)
                .map(|i| ItemView {
                    pos: i.pos,
                    kind: i.kind,
                    wobble: i.wobble,
                })
                .collect(),
            gates: state
                .world
                .gates
                .iter()
                .map(|g| GateView {
                    pos: g.pos,
                    target: g.target,
                    open: g.open,
                })
                .collect(),
            npcs: state
                .world
                .npcs
                .iter()
                .map(|n| NpcView {
                    pos: n.pos,
                    name: n.name,
                })
                .collect(),
            shards: state
                .world
                .shards
                .iter()
                .filter(|s| !s.collected)
                .map(|s| s.pos)
                .collect(),
            effects: state
                .effects
                .iter()
                .filter(|e| !reduced_motion || matches!(e, Effect::Ring { .. }))
                .cloned()
                .collect(),
        }
    }
}

impl HudState {
    /// `muted` comes from the audio engine; the sim does not track it
    pub fn capture(state: &GameState, muted: bool) -> Self {
        Self {
            tens: state.player.tens,
            ones: state.player.ones,
            total: state.player.total(),
            solved: state.solved,
            goal: PUZZLES_TO_SOLVE,
            muted,
            show_help: state.show_help,
            won: state.won,
            message: state.messages.first().map(|m| m.text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_omits_picked_items_and_collected_shards() {
        let mut state = GameState::new(11);
        let total_items = state.world.items.len();
        state.world.items[0].picked = true;
        state.world.shards[0].collected = true;

        let snap = RenderSnapshot::capture(&state, false);
        assert_eq!(snap.items.len(), total_items - 1);
        assert_eq!(snap.shards.len(), state.world.shards.len() - 1);
    }

    #[test]
    fn test_reduced_motion_filters_bursts_but_keeps_rings() {
        use crate::sim::effects::{colors, spawn_confetti, spawn_ring, spawn_sparkles};

        let mut state = GameState::new(11);
        let pos = state.player.pos;
        spawn_ring(&mut state.effects, pos, colors::TEN_GOLD);
        spawn_confetti(&mut state.effects, &mut state.rng, pos);
        spawn_sparkles(&mut state.effects, &mut state.rng, pos, colors::TEN_SPARK);

        let full = RenderSnapshot::capture(&state, false);
        assert_eq!(full.effects.len(), state.effects.len());

        let calm = RenderSnapshot::capture(&state, true);
        assert_eq!(calm.effects.len(), 1);
        assert!(matches!(calm.effects[0], Effect::Ring { .. }));
    }

    #[test]
    fn test_hud_digest() {
        let mut state = GameState::new(11);
        state.player.tens = 2;
        state.player.ones = 4;
        state.solved = 1;

        let hud = HudState::capture(&state, true);
        assert_eq!(hud.total, 24);
        assert_eq!(hud.solved, 1);
        assert_eq!(hud.goal, PUZZLES_TO_SOLVE);
        assert!(hud.muted);
        // Welcome message is queued by world generation
        assert!(hud.message.is_some());
    }
}
