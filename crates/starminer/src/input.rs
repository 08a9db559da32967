//! Input state
//!
//! The input collaborator hands the simulation a plain key-state map: key
//! name → currently held. The simulation polls it once per tick and never
//! subscribes to raw events.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of which keys are held
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    keys: HashMap<String, bool>,
}

impl KeyState {
    /// No keys held
    pub fn new() -> Self {
        Self::default()
    }

    /// Key state with every key in `keys` held
    pub fn with_held<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut state = Self::new();
        for key in keys {
            state.set(key, true);
        }
        state
    }

    /// Record whether `key` is held
    pub fn set(&mut self, key: &str, held: bool) {
        self.keys.insert(key.to_ascii_lowercase(), held);
    }

    /// Whether `key` is held; unknown keys are released
    pub fn is_held(&self, key: &str) -> bool {
        self.keys
            .get(&key.to_ascii_lowercase())
            .copied()
            .unwrap_or(false)
    }

    /// `+1` when only `positive` is held, `-1` when only `negative` is held, else `0`
    pub fn axis(&self, negative: &str, positive: &str) -> f32 {
        let mut value = 0.0;
        if self.is_held(positive) {
            value += 1.0;
        }
        if self.is_held(negative) {
            value -= 1.0;
        }
        value
    }
}

/// Key bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Nose down; double-tap shifts throttle up a gear
    pub pitch_forward: String,
    /// Nose up; double-tap shifts throttle down a gear
    pub pitch_back: String,
    /// Yaw left (strafe left with the modifier)
    pub yaw_left: String,
    /// Yaw right (strafe right with the modifier)
    pub yaw_right: String,
    /// Roll left
    pub roll_left: String,
    /// Roll right
    pub roll_right: String,
    /// Turns yaw keys into lateral strafe
    pub strafe_modifier: String,
    /// Fire the main gun
    pub fire: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            pitch_forward: "w".to_string(),
            pitch_back: "s".to_string(),
            yaw_left: "a".to_string(),
            yaw_right: "d".to_string(),
            roll_left: "q".to_string(),
            roll_right: "e".to_string(),
            strafe_modifier: "shift".to_string(),
            fire: "space".to_string(),
        }
    }
}
