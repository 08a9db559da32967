//! Ship state
//!
//! Session-scoped player resources that are not per-entity component data:
//! energy, cargo hold, credits, throttle gear and the docked pause flag.

use crate::config::ShipLoadout;

/// Snapshot of the player's resources, reported to the HUD on change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipStats {
    /// Current energy
    pub energy: f32,
    /// Energy pool size
    pub max_energy: f32,
    /// Cargo units held
    pub storage: u32,
    /// Cargo capacity
    pub max_storage: u32,
    /// Value of the cargo held, not yet banked
    pub credits: f32,
    /// Credits deposited at the home base
    pub banked_credits: f32,
    /// Throttle gear
    pub gear: u32,
    /// Docked at the home base; gameplay is suspended until resumed
    pub paused: bool,
}

impl ShipStats {
    /// Fresh stats for a launch with `loadout`
    pub fn from_loadout(loadout: &ShipLoadout, start_gear: u32) -> Self {
        Self {
            energy: loadout.max_energy,
            max_energy: loadout.max_energy,
            storage: 0,
            max_storage: loadout.storage_capacity,
            credits: 0.0,
            banked_credits: 0.0,
            gear: start_gear,
            paused: false,
        }
    }

    /// Whether the hold can take another unit
    pub fn has_cargo_space(&self) -> bool {
        self.storage < self.max_storage
    }

    /// Spend `amount` energy if available; energy never goes negative
    pub fn spend_energy(&mut self, amount: f32) -> bool {
        if self.energy <= 0.0 {
            return false;
        }
        self.energy = (self.energy - amount).max(0.0);
        true
    }

    /// Regain `amount` energy, capped at the pool size
    pub fn regen_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).clamp(0.0, self.max_energy);
    }

    /// Add one cargo unit worth `value`; refused when the hold is full
    pub fn store(&mut self, value: f32) -> bool {
        if !self.has_cargo_space() {
            return false;
        }
        self.storage += 1;
        self.credits += value;
        true
    }

    /// Empty the hold into the bank, returning the credits deposited
    pub fn deposit(&mut self) -> f32 {
        let deposited = self.credits;
        self.banked_credits += deposited;
        self.credits = 0.0;
        self.storage = 0;
        deposited
    }
}
