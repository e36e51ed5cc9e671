//! Game state and core simulation types
//!
//! Everything gameplay-visible lives here. The sim is deterministic given a
//! seed: all randomness flows through the state-owned PCG generator and all
//! timing through the state-owned sim clock, never wall time.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::effects::Effect;
use crate::consts::*;

/// Collectible denominations (base-10 place values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    /// A 10-stick, worth ten
    Ten,
    /// A 1-stone, worth one
    One,
}

impl ItemKind {
    pub fn value(&self) -> u32 {
        match self {
            ItemKind::Ten => 10,
            ItemKind::One => 1,
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            ItemKind::Ten => "10-stick",
            ItemKind::One => "1-stone",
        }
    }
}

/// A collectible on the map
#[derive(Debug, Clone)]
pub struct Item {
    pub pos: Vec2,
    pub kind: ItemKind,
    pub picked: bool,
    /// Sim time before which this item cannot be picked up (set on drop so
    /// the dropper does not instantly re-collect it)
    pub pickup_suppressed_until: Option<f64>,
    /// Decorative bob phase for the renderer
    pub wobble: f32,
}

impl Item {
    /// Whether the item can be collected at sim time `now`
    pub fn available(&self, now: f64) -> bool {
        !self.picked && self.pickup_suppressed_until.is_none_or(|t| now >= t)
    }
}

/// One circular lump of an island cluster
#[derive(Debug, Clone, Copy)]
pub struct Lump {
    pub center: Vec2,
    pub radius: f32,
    /// Grass hue for the renderer
    pub hue: i32,
}

/// A friendly character that offers hints when approached
#[derive(Debug, Clone)]
pub struct Npc {
    pub pos: Vec2,
    pub name: &'static str,
    pub hint: &'static str,
    pub talk_radius: f32,
}

/// A puzzle checkpoint: opens irreversibly on an exact inventory match
#[derive(Debug, Clone)]
pub struct Gate {
    pub id: u32,
    pub pos: Vec2,
    pub target: u32,
    pub open: bool,
}

/// Bonus collectible, eligible only while its owning gate is open
#[derive(Debug, Clone)]
pub struct Shard {
    pub pos: Vec2,
    pub collected: bool,
    pub gate_id: u32,
}

/// Static terrain plus the entity populations
#[derive(Debug, Clone)]
pub struct World {
    pub width: f32,
    pub height: f32,
    /// Island clusters; immutable after generation
    pub islands: Vec<Vec<Lump>>,
    pub items: Vec<Item>,
    pub gates: Vec<Gate>,
    pub npcs: Vec<Npc>,
    pub shards: Vec<Shard>,
}

impl World {
    pub fn empty() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            islands: Vec::new(),
            items: Vec::new(),
            gates: Vec::new(),
            npcs: Vec::new(),
            shards: Vec::new(),
        }
    }

    /// Containment test: a point is land if it lies inside any lump circle
    pub fn is_land(&self, p: Vec2) -> bool {
        self.islands.iter().flatten().any(|lump| {
            let d = p - lump.center;
            d.length_squared() <= lump.radius * lump.radius
        })
    }
}

/// The explorer
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    /// Facing angle in radians; holds its last value while idle
    pub facing: f32,
    pub tens: u32,
    pub ones: u32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(200.0, 200.0),
            vel: Vec2::ZERO,
            speed: PLAYER_SPEED,
            facing: 0.0,
            tens: 0,
            ones: 0,
        }
    }

    /// Inventory total: tens * 10 + ones
    pub fn total(&self) -> u32 {
        self.tens * 10 + self.ones
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// A user-facing message with a remaining display time (seconds)
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub remaining: f64,
}

/// Notable things that happened during a tick or discrete action.
///
/// Drained by the host each frame to drive audio, narration, and logging;
/// the sim never calls into the audio engine directly.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ItemPicked(ItemKind),
    ItemDropped(ItemKind),
    DropRefused(ItemKind),
    GateOpened { target: u32, tens: u32, ones: u32 },
    GateMismatch { diff: i32 },
    NoGateNearby,
    ShardCollected,
    NpcHint { name: &'static str, hint: &'static str },
    Footstep { on_land: bool },
    Won,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Sim clock in seconds, advanced by dt each tick
    pub time: f64,
    pub world: World,
    pub player: Player,
    /// Top-left of the viewport in world coordinates
    pub camera: Vec2,
    /// Gates opened so far this session
    pub solved: u32,
    /// Set exactly once, when `solved` reaches PUZZLES_TO_SOLVE
    pub won: bool,
    pub show_help: bool,
    /// Sim time of the most recent NPC hint (any NPC)
    pub last_hint_time: f64,
    pub messages: Vec<Message>,
    /// Decorative feedback; never read back by gameplay
    pub effects: Vec<Effect>,
    /// Pending events for the host to drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh session and generate its world
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            world: World::empty(),
            player: Player::new(),
            camera: Vec2::ZERO,
            solved: 0,
            won: false,
            show_help: true,
            last_hint_time: f64::NEG_INFINITY,
            messages: Vec::new(),
            effects: Vec::new(),
            events: Vec::new(),
        };
        super::worldgen::generate_world(&mut state);
        state
    }

    /// Queue a message for the HUD message bubble
    pub fn enqueue_message(&mut self, text: impl Into<String>, duration_secs: f64) {
        self.messages.push(Message {
            text: text.into(),
            remaining: duration_secs,
        });
    }

    /// Take all pending events, leaving the buffer empty
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_land() {
        let mut world = World::empty();
        world.islands.push(vec![Lump {
            center: Vec2::new(100.0, 100.0),
            radius: 50.0,
            hue: 100,
        }]);

        assert!(world.is_land(Vec2::new(100.0, 100.0)));
        assert!(world.is_land(Vec2::new(140.0, 100.0)));
        assert!(!world.is_land(Vec2::new(200.0, 200.0)));
    }

    #[test]
    fn test_inventory_total() {
        let mut player = Player::new();
        player.tens = 3;
        player.ones = 7;
        assert_eq!(player.total(), 37);
    }

    #[test]
    fn test_item_suppression_window() {
        let item = Item {
            pos: Vec2::ZERO,
            kind: ItemKind::One,
            picked: false,
            pickup_suppressed_until: Some(1.5),
            wobble: 0.0,
        };
        assert!(!item.available(1.0));
        assert!(item.available(1.5));
        assert!(item.available(2.0));
    }
}
