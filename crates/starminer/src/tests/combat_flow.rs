//! Lock, fire, hit and destruction across the combat, voxel and spawn systems

use super::{game_with, quiet_config, run, set_position, spec, tick, TestGame};
use crate::components::ObjectKind;
use crate::config::{GameConfig, OccluderPolicy};
use crate::hooks::GameEvent;
use crate::input::KeyState;
use crate::systems::{FireOutcome, ObjectBlueprint};
use crate::voxel::{VoxelGeometry, VoxelGrid};
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{IVec3, Vec3};

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> KeyState {
        KeyState::new()
    }

    fn destroyed_events(game: &TestGame, entity: Entity) -> usize {
        game.events()
            .count(|e| matches!(e, GameEvent::Destroyed { entity: destroyed, .. } if *destroyed == entity))
    }

    fn spawn_asteroid(game: &mut TestGame, position: Vec3, scale: f32, max_hp: f32) -> Entity {
        game.spawn_object(ObjectBlueprint::new(spec(ObjectKind::Asteroid, max_hp, 15.0), position, scale))
    }

    #[test]
    fn test_lock_fire_destroy_cycle() {
        let mut game = game_with(quiet_config());
        let asteroid = spawn_asteroid(&mut game, Vec3::new(0.0, 0.0, 60.0), 4.0, 20.0);

        tick(&mut game, &idle());
        assert_eq!(game.lock_target(), Some(asteroid));

        // First shot takes half the health
        game.request_fire();
        run(&mut game, 30, &idle());
        assert_eq!(game.last_fire(), Some(FireOutcome::Fired));
        assert_eq!(game.world().health(asteroid).map(|h| h.hp), Some(10.0));
        assert_eq!(game.events().count(|e| matches!(e, GameEvent::Hit { .. })), 1);
        assert!(game.world().contains(asteroid));

        // Second shot finishes it
        game.request_fire();
        run(&mut game, 30, &idle());
        assert!(!game.world().contains(asteroid));
        assert!(!game.registry().is_bound(asteroid));
        assert_eq!(destroyed_events(&game, asteroid), 1);
        assert_eq!(game.spawner().destroyed_count(), 1);
        assert_eq!(game.lock_target(), None);
        assert!(game.events().events().contains(&GameEvent::Lock(None)));

        // Coins dropped in its place
        assert_eq!(game.world().loot_entities().len(), 3);

        // Destroying again is a no-op
        assert!(!game.destroy_object(asteroid));
        run(&mut game, 10, &idle());
        assert_eq!(destroyed_events(&game, asteroid), 1);
        assert_eq!(game.spawner().destroyed_count(), 1);
    }

    #[test]
    fn test_hit_carves_clamped_voxel_count() {
        let mut config = quiet_config();
        config.loadout.weapon_power = 20.0;
        let mut game = game_with(config);

        // 100 voxels, 100 hp: 20 damage asks for 20 voxels, capped at 18
        let grid = VoxelGrid::filled_box(IVec3::new(5, 5, 4), 0.5);
        assert_eq!(grid.len(), 100);
        let blueprint =
            ObjectBlueprint::new(spec(ObjectKind::Asteroid, 100.0, 0.0), Vec3::new(0.0, 0.0, 60.0), 1.0).with_grid(grid);
        let asteroid = game.spawn_object(blueprint);

        tick(&mut game, &idle());
        game.request_fire();
        run(&mut game, 30, &idle());

        assert_eq!(game.world().health(asteroid).map(|h| h.hp), Some(80.0));
        assert_eq!(game.voxels().grid(asteroid).map(VoxelGrid::len), Some(82));
        assert!(game.voxels().rebuild_count(asteroid) >= 1);
        assert!(!game.voxel_system().is_queued(asteroid));
    }

    #[test]
    fn test_lock_hysteresis_and_cooldown() {
        let mut game = game_with(quiet_config());
        let asteroid = spawn_asteroid(&mut game, Vec3::new(5.0, 0.0, 60.0), 2.0, 50.0);

        tick(&mut game, &idle());
        assert_eq!(game.lock_target(), Some(asteroid));

        // Between the acquire and keep radii: the held lock survives
        set_position(&mut game, asteroid, Vec3::new(-35.0, 0.0, 60.0));
        run(&mut game, 5, &idle());
        assert_eq!(game.lock_target(), Some(asteroid));

        // Past the keep radius: released
        set_position(&mut game, asteroid, Vec3::new(-60.0, 0.0, 60.0));
        tick(&mut game, &idle());
        assert_eq!(game.lock_target(), None);
        assert!(game.combat().reacquire_cooldown() > 0.0);

        // Back in the middle of the screen, but still cooling down
        set_position(&mut game, asteroid, Vec3::new(5.0, 0.0, 60.0));
        tick(&mut game, &idle());
        assert_eq!(game.lock_target(), None);

        run(&mut game, 15, &idle());
        assert_eq!(game.lock_target(), Some(asteroid));
    }

    #[test]
    fn test_keep_radius_does_not_acquire() {
        let mut game = game_with(quiet_config());
        spawn_asteroid(&mut game, Vec3::new(-35.0, 0.0, 60.0), 2.0, 50.0);
        run(&mut game, 10, &idle());
        assert_eq!(game.lock_target(), None);
    }

    /// Lock a planet, then put an asteroid in the line of fire and shoot once
    fn fire_past_occluder(policy: OccluderPolicy) -> (TestGame, Entity, Entity) {
        let mut config = quiet_config();
        config.combat.occluder_policy = policy;
        let mut game = game_with(config);

        let planet = game.spawn_object(ObjectBlueprint::new(
            spec(ObjectKind::Planet, 1000.0, 0.0),
            Vec3::new(0.0, 0.0, 150.0),
            10.0,
        ));
        tick(&mut game, &idle());
        assert_eq!(game.lock_target(), Some(planet));

        let asteroid = spawn_asteroid(&mut game, Vec3::new(0.0, 0.0, 60.0), 3.0, 1000.0);
        tick(&mut game, &idle());
        assert_eq!(game.lock_target(), Some(planet));

        game.request_fire();
        run(&mut game, 60, &idle());
        (game, planet, asteroid)
    }

    #[test]
    fn test_solid_occluder_takes_the_hit() {
        let (game, planet, asteroid) = fire_past_occluder(OccluderPolicy::Solid);
        assert_eq!(game.world().health(asteroid).map(|h| h.hp), Some(990.0));
        assert_eq!(game.world().health(planet).map(|h| h.hp), Some(1000.0));
    }

    #[test]
    fn test_locked_planet_shot_pierces_occluder() {
        let (game, planet, asteroid) = fire_past_occluder(OccluderPolicy::PierceForLockedPlanets);
        assert_eq!(game.world().health(asteroid).map(|h| h.hp), Some(1000.0));
        assert_eq!(game.world().health(planet).map(|h| h.hp), Some(990.0));
    }

    #[test]
    fn test_pierce_ends_when_locked_target_is_gone() {
        let mut config = quiet_config();
        config.combat.occluder_policy = OccluderPolicy::PierceForLocked;
        let mut game = game_with(config);

        let planet = game.spawn_object(ObjectBlueprint::new(
            spec(ObjectKind::Planet, 1000.0, 0.0),
            Vec3::new(0.0, 0.0, 150.0),
            10.0,
        ));
        tick(&mut game, &idle());
        assert_eq!(game.lock_target(), Some(planet));

        game.request_fire();
        tick(&mut game, &idle());
        assert_eq!(game.combat().projectiles().len(), 1);

        // The shot's target vanishes mid-flight; the next object in its path takes the hit
        assert!(game.destroy_object(planet));
        let asteroid = spawn_asteroid(&mut game, Vec3::new(0.0, 0.0, 60.0), 3.0, 1000.0);
        run(&mut game, 60, &idle());
        assert_eq!(game.world().health(asteroid).map(|h| h.hp), Some(990.0));
    }

    #[test]
    fn test_simultaneous_hits_destroy_once() {
        let mut config = quiet_config();
        config.combat.fire_interval = 0.0;
        let mut game = game_with(config);

        // Two shots in flight, one step apart
        game.request_fire();
        tick(&mut game, &idle());
        game.request_fire();
        tick(&mut game, &idle());
        assert_eq!(game.combat().projectiles().len(), 2);

        // Both segments cross this sphere on the next tick
        let asteroid = spawn_asteroid(&mut game, Vec3::new(0.0, 0.0, 12.0), 3.0, 10.0);
        tick(&mut game, &idle());

        assert!(!game.world().contains(asteroid));
        assert_eq!(destroyed_events(&game, asteroid), 1);
        assert_eq!(game.events().count(|e| matches!(e, GameEvent::Hit { .. })), 1);
        assert_eq!(game.spawner().destroyed_count(), 1);
        assert_eq!(game.combat().projectiles().len(), 1);
    }

    #[test]
    fn test_fire_rejections_consume_nothing() {
        let mut game = game_with(quiet_config());
        tick(&mut game, &idle());

        assert_eq!(game.try_fire(1.0), FireOutcome::Fired);
        let energy = game.stats().energy;
        assert_eq!(game.try_fire(1.05), FireOutcome::CoolingDown);
        assert_eq!(game.stats().energy, energy);
        assert_eq!(game.try_fire(1.2), FireOutcome::Fired);

        game.stats_mut().energy = 0.0;
        assert_eq!(game.try_fire(2.0), FireOutcome::OutOfEnergy);
        assert_eq!(game.try_fire(3.0), FireOutcome::OutOfEnergy);
        assert_eq!(game.events().messages().filter(|m| *m == "Energy depleted").count(), 1);

        game.stats_mut().energy = 50.0;
        game.stats_mut().paused = true;
        assert_eq!(game.try_fire(4.0), FireOutcome::Paused);
        assert_eq!(game.stats().energy, 50.0);
        assert_eq!(game.combat().projectiles().len(), 2);
    }

    #[test]
    fn test_fire_key_while_docked_reports_paused() {
        let mut game = game_with(quiet_config());
        game.stats_mut().paused = true;
        let fire = KeyState::with_held([GameConfig::default().controls.fire.as_str()]);
        tick(&mut game, &fire);
        assert_eq!(game.last_fire(), Some(FireOutcome::Paused));
        assert!(game.combat().projectiles().is_empty());
    }

    #[test]
    fn test_bindings_never_outlive_entities() {
        let mut game = game_with(quiet_config());
        let asteroid = spawn_asteroid(&mut game, Vec3::new(0.0, 0.0, 60.0), 4.0, 10.0);

        tick(&mut game, &idle());
        game.request_fire();
        run(&mut game, 30, &idle());
        assert!(!game.world().contains(asteroid));

        // Fly into the coins and let the magnet pull them in
        let player = game.player();
        set_position(&mut game, player, Vec3::new(0.0, 0.0, 60.0));
        run(&mut game, 180, &idle());
        assert!(game.loot().collected_count() > 0);

        for (entity, handle) in game.registry().iter() {
            assert!(game.world().contains(entity), "{entity} bound after removal");
            assert!(game.renderer().object(handle).is_some());
        }
        for entity in game.world().objects().into_iter().chain(game.world().loot_entities()) {
            assert!(game.registry().is_bound(entity));
        }
    }
}
