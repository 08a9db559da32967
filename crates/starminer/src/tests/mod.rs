//! Whole-game scenario tests
//!
//! These drive a [`Game`] with the headless collaborators tick by tick and
//! check behaviour that spans several systems.

mod combat_flow;

use crate::components::{ObjectKind, ObjectSpec};
use crate::config::GameConfig;
use crate::game::Game;
use crate::hooks::EventLog;
use crate::input::KeyState;
use crate::render::HeadlessRenderer;
use crate::voxel::VoxelStore;
use nova_engine::foundation::math::Vec3;

pub(crate) type TestGame = Game<HeadlessRenderer, EventLog, VoxelStore>;

pub(crate) const DT: f32 = 1.0 / 60.0;

pub(crate) fn game_with(config: GameConfig) -> TestGame {
    Game::new(config, HeadlessRenderer::new(), EventLog::new(), VoxelStore::new()).unwrap()
}

/// Game with no ambient field, so renderer counts only reflect gameplay
pub(crate) fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.world.ambient_count = 0;
    config
}

/// Run one tick with wall time derived from the tick counter
pub(crate) fn tick(game: &mut TestGame, keys: &KeyState) {
    let wall_time = game.ticks() as f64 * f64::from(DT);
    game.step(DT, wall_time, keys);
}

pub(crate) fn run(game: &mut TestGame, ticks: usize, keys: &KeyState) {
    for _ in 0..ticks {
        tick(game, keys);
    }
}

pub(crate) fn spec(kind: ObjectKind, max_hp: f32, loot_value: f32) -> ObjectSpec {
    ObjectSpec {
        kind,
        loot_value,
        max_hp,
    }
}

pub(crate) fn set_position(game: &mut TestGame, entity: nova_engine::ecs::Entity, position: Vec3) {
    if let Some(transform) = game.world_mut().transform.get_mut(entity) {
        transform.position = position;
    }
}
