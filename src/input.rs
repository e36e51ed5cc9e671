//! Keyboard state and action mapping
//!
//! The host feeds raw `KeyboardEvent.code` strings in; continuous movement is
//! read back as a direction vector each frame, while discrete actions are
//! reported once per physical press (OS key repeat is filtered out).

use glam::Vec2;
use std::collections::HashSet;

/// Discrete, once-per-press player intents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AttemptGate,
    DropOne,
    DropTen,
    ToggleHelp,
    ToggleMute,
    Reset,
}

/// Currently-held keys plus the code -> action mapping
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key press. Returns the mapped action only on a fresh press;
    /// auto-repeat events for a held key return None.
    pub fn key_down(&mut self, code: &str) -> Option<Action> {
        if !self.held.insert(code.to_string()) {
            return None;
        }
        match code {
            "Space" | "Enter" => Some(Action::AttemptGate),
            "KeyQ" => Some(Action::DropOne),
            "KeyE" => Some(Action::DropTen),
            "KeyH" => Some(Action::ToggleHelp),
            "KeyM" => Some(Action::ToggleMute),
            "KeyR" => Some(Action::Reset),
            _ => None,
        }
    }

    pub fn key_up(&mut self, code: &str) {
        self.held.remove(code);
    }

    /// Drop all held keys (used when the tab loses focus, so keys released
    /// while unfocused do not stick)
    pub fn clear(&mut self) {
        self.held.clear();
    }

    fn down(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    /// Movement direction from arrows/WASD; unnormalized axis sum in
    /// {-1, 0, 1} per component
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.down("ArrowLeft") || self.down("KeyA") {
            dir.x -= 1.0;
        }
        if self.down("ArrowRight") || self.down("KeyD") {
            dir.x += 1.0;
        }
        if self.down("ArrowUp") || self.down("KeyW") {
            dir.y -= 1.0;
        }
        if self.down("ArrowDown") || self.down("KeyS") {
            dir.y += 1.0;
        }
        dir
    }
}
