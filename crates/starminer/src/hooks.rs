//! Notification collaborator boundary
//!
//! Audio, HUD and navigation listen to the simulation through
//! [`GameEvents`]. Every hook is fire-and-forget: it receives primitive
//! values and cannot feed anything back into simulation state.

use crate::components::{LootKind, ObjectKind};
use crate::state::ShipStats;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::Vec3;

/// Hooks called by the simulation; every method defaults to doing nothing
pub trait GameEvents {
    /// A projectile struck an object
    fn play_hit(&mut self, _position: Vec3, _magnitude: f32) {}

    /// An object blew up
    fn play_explosion(&mut self, _position: Vec3, _magnitude: f32) {}

    /// The main gun fired
    fn play_shot(&mut self, _position: Vec3) {}

    /// A pickup was collected
    fn play_pickup(&mut self, _position: Vec3, _kind: LootKind) {}

    /// Show a transient message to the player
    fn show_message(&mut self, _text: &str) {}

    /// Energy, cargo, credits or gear changed
    fn stats_changed(&mut self, _stats: ShipStats) {}

    /// New smoothed crosshair position in normalized device coordinates
    fn crosshair_moved(&mut self, _x: f32, _y: f32, _locked: bool) {}

    /// Lock acquired (`Some`) or released (`None`)
    fn lock_changed(&mut self, _target: Option<Entity>) {}

    /// An object was destroyed and removed from the world
    fn object_destroyed(&mut self, _entity: Entity, _kind: ObjectKind, _position: Vec3) {}

    /// Navigation overlay update, once per tick
    fn navigation_update(&mut self, _player: Vec3, _base: Vec3) {}
}

/// Listener that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl GameEvents for NullEvents {}

/// A recorded hook call
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// See [`GameEvents::play_hit`]
    Hit {
        /// Impact point
        position: Vec3,
        /// Damage dealt
        magnitude: f32,
    },
    /// See [`GameEvents::play_explosion`]
    Explosion {
        /// Blast center
        position: Vec3,
        /// Size of the destroyed object
        magnitude: f32,
    },
    /// See [`GameEvents::play_shot`]
    Shot {
        /// Muzzle position
        position: Vec3,
    },
    /// See [`GameEvents::play_pickup`]
    Pickup {
        /// Where the pickup was consumed
        position: Vec3,
        /// Pickup kind
        kind: LootKind,
    },
    /// See [`GameEvents::show_message`]
    Message(String),
    /// See [`GameEvents::stats_changed`]
    Stats(ShipStats),
    /// See [`GameEvents::lock_changed`]
    Lock(Option<Entity>),
    /// See [`GameEvents::object_destroyed`]
    Destroyed {
        /// Entity that was removed
        entity: Entity,
        /// Its object kind
        kind: ObjectKind,
    },
}

/// Listener that records hook calls
///
/// Crosshair and navigation updates fire every tick, so only their latest
/// values are kept.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<GameEvent>,
    /// Latest crosshair `(x, y, locked)`
    pub crosshair: Option<(f32, f32, bool)>,
    /// Latest navigation `(player, base)`
    pub navigation: Option<(Vec3, Vec3)>,
}

impl EventLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event in order
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }

    /// Messages shown so far
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            GameEvent::Message(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Latest stats snapshot
    pub fn last_stats(&self) -> Option<ShipStats> {
        self.events.iter().rev().find_map(|event| match event {
            GameEvent::Stats(stats) => Some(*stats),
            _ => None,
        })
    }

    /// Drop recorded events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl GameEvents for EventLog {
    fn play_hit(&mut self, position: Vec3, magnitude: f32) {
        self.events.push(GameEvent::Hit { position, magnitude });
    }

    fn play_explosion(&mut self, position: Vec3, magnitude: f32) {
        self.events.push(GameEvent::Explosion { position, magnitude });
    }

    fn play_shot(&mut self, position: Vec3) {
        self.events.push(GameEvent::Shot { position });
    }

    fn play_pickup(&mut self, position: Vec3, kind: LootKind) {
        self.events.push(GameEvent::Pickup { position, kind });
    }

    fn show_message(&mut self, text: &str) {
        self.events.push(GameEvent::Message(text.to_string()));
    }

    fn stats_changed(&mut self, stats: ShipStats) {
        self.events.push(GameEvent::Stats(stats));
    }

    fn crosshair_moved(&mut self, x: f32, y: f32, locked: bool) {
        self.crosshair = Some((x, y, locked));
    }

    fn lock_changed(&mut self, target: Option<Entity>) {
        self.events.push(GameEvent::Lock(target));
    }

    fn object_destroyed(&mut self, entity: Entity, kind: ObjectKind, _position: Vec3) {
        self.events.push(GameEvent::Destroyed { entity, kind });
    }

    fn navigation_update(&mut self, player: Vec3, base: Vec3) {
        self.navigation = Some((player, base));
    }
}
