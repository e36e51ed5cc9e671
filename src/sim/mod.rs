//! Deterministic gameplay simulation
//!
//! Pure with respect to the platform: no wall clock, no DOM, no audio. The
//! host feeds `TickInput` and a dt into [`tick`] and drains [`GameEvent`]s
//! back out.

pub mod camera;
pub mod effects;
pub mod state;
pub mod tick;
pub mod worldgen;

pub use effects::Effect;
pub use state::{GameEvent, GameState, Gate, Item, ItemKind, Npc, Player, Shard, World};
pub use tick::{TickInput, tick};
