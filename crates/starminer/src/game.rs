//! Game driver
//!
//! [`Game`] owns the world, the collaborators, every gameplay system and the
//! fixed-timestep loop. The host calls [`Game::frame`] once per rendered
//! frame; the loop turns elapsed wall time into whole simulation ticks, and
//! each tick runs the systems in their load-bearing order.

use crate::components::{Loot, Transform};
use crate::config::GameConfig;
use crate::hooks::GameEvents;
use crate::input::KeyState;
use crate::render::{Registry, RenderBackend, RenderKind, RenderSlot};
use crate::state::ShipStats;
use crate::systems::{
    Camera, CameraSystem, CombatSystem, EnvironmentSystem, FireOutcome, LootSystem, MovementSystem,
    ObjectBlueprint, SpawnSystem, TickContext, VfxSystem, VoxelDestructionSystem,
};
use crate::voxel::VoxelGeometry;
use crate::world::World;
use nova_engine::config::ConfigError;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{Quat, Vec3};
use nova_engine::foundation::time::{FixedTimestepLoop, StepReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

/// Game setup errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for game setup
pub type GameResult<T> = Result<T, GameError>;

/// Engine exhaust position in ship space
const EXHAUST_OFFSET: [f32; 3] = [0.0, 0.0, -1.5];

/// A running game session
pub struct Game<R, E, V> {
    config: GameConfig,
    world: World,
    registry: Registry,
    renderer: R,
    events: E,
    voxels: V,
    stats: ShipStats,
    player: Entity,
    fixed: FixedTimestepLoop,

    movement: MovementSystem,
    environment: EnvironmentSystem,
    camera: CameraSystem,
    combat: CombatSystem,
    voxel_system: VoxelDestructionSystem,
    vfx: VfxSystem,
    spawn: SpawnSystem,
    loot: LootSystem,

    fire_latch: bool,
    last_fire: Option<FireOutcome>,
    ticks: u64,
}

impl<R, E, V> Game<R, E, V>
where
    R: RenderBackend,
    E: GameEvents,
    V: VoxelGeometry,
{
    /// Validate `config` and build a session with the player at the origin
    pub fn new(config: GameConfig, mut renderer: R, events: E, voxels: V) -> GameResult<Self> {
        config.validate()?;

        let sim = &config.simulation;
        let fixed = FixedTimestepLoop::new(sim.step_hz, sim.max_sub_steps).with_max_frame_time(sim.max_frame_time);
        let seed = sim.seed;

        let mut world = World::new();
        let mut registry = Registry::new();
        let player = world.create_entity();
        world.transform.insert(player, Transform::default());
        world.velocity.insert(player, Vec3::zeros());
        world.rotation.insert(player, Quat::identity());
        let ship = renderer.create(RenderKind::Ship);
        registry.bind(player, ship, RenderSlot::owned(RenderKind::Ship));

        let mut environment = EnvironmentSystem::new();
        let mut rng = StdRng::seed_from_u64(seed);
        environment.spawn_ambient(&mut renderer, &mut rng, Vec3::zeros(), &config.world);

        let stats = ShipStats::from_loadout(&config.loadout, config.flight.start_gear);
        log::info!(
            "Game ready: {} Hz, loadout power {} speed {} hold {} energy {}",
            sim.step_hz,
            config.loadout.weapon_power,
            config.loadout.speed,
            config.loadout.storage_capacity,
            config.loadout.max_energy
        );

        Ok(Self {
            movement: MovementSystem::new(&config.flight, &config.controls, &config.loadout),
            environment,
            camera: CameraSystem::new(&config.camera),
            combat: CombatSystem::new(
                &config.combat,
                &config.lock,
                &config.voxel,
                &config.loadout,
                config.world.projectile_pool_capacity,
            ),
            voxel_system: VoxelDestructionSystem::new(&config.voxel),
            vfx: VfxSystem::new(&config.vfx, seed.wrapping_add(1)),
            spawn: SpawnSystem::new(&config.loot, &config.world, seed.wrapping_add(2)),
            loot: LootSystem::new(&config.loot, &config.world),
            config,
            world,
            registry,
            renderer,
            events,
            voxels,
            stats,
            player,
            fixed,
            fire_latch: false,
            last_fire: None,
            ticks: 0,
        })
    }

    /// Advance to wall-clock time `now` (seconds), running any due ticks
    pub fn frame(&mut self, now: f64, keys: &KeyState) -> StepReport {
        let report = self.fixed.advance(now, |_| {});
        let dt = self.fixed.fixed_dt();
        for _ in 0..report.steps {
            self.step(dt, now, keys);
        }
        report
    }

    /// Run one simulation tick of length `dt`
    ///
    /// `wall_time` gates the weapon cooldown. While docked only visual
    /// effects keep running until [`resume`](Self::resume) is called.
    pub fn step(&mut self, dt: f32, wall_time: f64, keys: &KeyState) {
        let step_scale = self.fixed.step_scale(dt);
        let fire_requested = std::mem::take(&mut self.fire_latch) || keys.is_held(&self.config.controls.fire);

        if self.stats.paused {
            if fire_requested {
                self.last_fire = Some(FireOutcome::Paused);
            }
            self.vfx.update(&mut self.renderer, dt, step_scale);
            self.ticks += 1;
            return;
        }

        // Movement
        let movement = self.movement.update(&mut self.world, self.player, keys, dt, step_scale);
        if movement.gear_changed {
            self.stats.gear = self.movement.gear();
            self.events.stats_changed(self.stats);
        }

        // Environment
        self.environment
            .update(&mut self.world, &self.registry, &mut self.renderer, self.player, step_scale);

        // Camera
        self.camera.update(&self.world, self.player);
        self.renderer.set_camera(self.camera.camera());

        // Combat
        let mut ctx = TickContext {
            world: &mut self.world,
            registry: &mut self.registry,
            renderer: &mut self.renderer,
            events: &mut self.events,
            voxels: &mut self.voxels,
            stats: &mut self.stats,
        };
        let outcome = self.combat.update(
            &mut ctx,
            self.camera.camera(),
            self.player,
            &mut self.spawn,
            &mut self.vfx,
            &mut self.voxel_system,
            fire_requested.then_some(wall_time),
            dt,
            step_scale,
        );
        if outcome.is_some() {
            self.last_fire = outcome;
        }

        // Voxel rebuilds
        self.voxel_system.update(dt, &self.world, &mut self.voxels);

        // Navigation
        if let Some(position) = self.world.position(self.player) {
            self.events.navigation_update(position, self.config.world.base_position);
        }

        // Vfx
        if let (Some(position), Some(rotation)) = (self.world.position(self.player), self.world.rotation.get(self.player)) {
            let exhaust = position + rotation * Vec3::from(EXHAUST_OFFSET);
            let backward = rotation * -Vec3::z();
            self.vfx
                .emit_trail(&mut self.renderer, dt, movement.thrusting, exhaust, backward);
        }
        self.vfx.update(&mut self.renderer, dt, step_scale);

        // Loot
        let mut ctx = TickContext {
            world: &mut self.world,
            registry: &mut self.registry,
            renderer: &mut self.renderer,
            events: &mut self.events,
            voxels: &mut self.voxels,
            stats: &mut self.stats,
        };
        self.loot.update(&mut ctx, &mut self.spawn, self.player, dt, step_scale);

        self.ticks += 1;
    }

    /// Queue a shot for the next tick, as if the fire key were held
    pub fn request_fire(&mut self) {
        self.fire_latch = true;
    }

    /// Fire immediately at wall-clock time `wall_time`
    pub fn try_fire(&mut self, wall_time: f64) -> FireOutcome {
        let mut ctx = TickContext {
            world: &mut self.world,
            registry: &mut self.registry,
            renderer: &mut self.renderer,
            events: &mut self.events,
            voxels: &mut self.voxels,
            stats: &mut self.stats,
        };
        let outcome = self.combat.try_fire(&mut ctx, self.player, wall_time);
        self.last_fire = Some(outcome);
        outcome
    }

    /// Leave the base after a deposit
    pub fn resume(&mut self) {
        if self.stats.paused {
            self.stats.paused = false;
            log::info!("Launching from base");
            self.events.stats_changed(self.stats);
        }
    }

    /// Place a destructible object
    pub fn spawn_object(&mut self, blueprint: ObjectBlueprint) -> Entity {
        self.spawn
            .spawn_object(&mut self.world, &mut self.registry, &mut self.renderer, &mut self.voxels, blueprint)
    }

    /// Scatter the configured object field
    pub fn seed_field(&mut self) -> Vec<Entity> {
        self.spawn
            .seed_field(&mut self.world, &mut self.registry, &mut self.renderer, &mut self.voxels)
    }

    /// Drop a pickup
    pub fn spawn_loot(&mut self, loot: Loot, position: Vec3, velocity: Vec3) -> Entity {
        self.spawn
            .spawn_loot(&mut self.world, &mut self.registry, &mut self.renderer, loot, position, velocity)
    }

    /// Destroy an object through the single destruction path
    pub fn destroy_object(&mut self, entity: Entity) -> bool {
        let mut ctx = TickContext {
            world: &mut self.world,
            registry: &mut self.registry,
            renderer: &mut self.renderer,
            events: &mut self.events,
            voxels: &mut self.voxels,
            stats: &mut self.stats,
        };
        self.spawn
            .destroy_object(&mut ctx, &mut self.vfx, &mut self.voxel_system, entity)
    }

    /// Active configuration
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Entity store
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable entity store, for scripted setups
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Entity ↔ renderable index
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Player entity
    pub fn player(&self) -> Entity {
        self.player
    }

    /// Player resources
    pub fn stats(&self) -> &ShipStats {
        &self.stats
    }

    /// Mutable player resources, for scripted setups
    pub fn stats_mut(&mut self) -> &mut ShipStats {
        &mut self.stats
    }

    /// Currently locked target
    pub fn lock_target(&self) -> Option<Entity> {
        self.combat.lock_target()
    }

    /// Outcome of the most recent fire request
    pub fn last_fire(&self) -> Option<FireOutcome> {
        self.last_fire
    }

    /// Current camera
    pub fn camera(&self) -> &Camera {
        self.camera.camera()
    }

    /// Combat state
    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    /// Movement state
    pub fn movement(&self) -> &MovementSystem {
        &self.movement
    }

    /// Particle state
    pub fn vfx(&self) -> &VfxSystem {
        &self.vfx
    }

    /// Spawner state
    pub fn spawner(&self) -> &SpawnSystem {
        &self.spawn
    }

    /// Loot state
    pub fn loot(&self) -> &LootSystem {
        &self.loot
    }

    /// Voxel rebuild scheduler
    pub fn voxel_system(&self) -> &VoxelDestructionSystem {
        &self.voxel_system
    }

    /// Render collaborator
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Notification collaborator
    pub fn events(&self) -> &E {
        &self.events
    }

    /// Mutable notification collaborator
    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Voxel-geometry collaborator
    pub fn voxels(&self) -> &V {
        &self.voxels
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fixed-step loop
    pub fn timestep(&self) -> &FixedTimestepLoop {
        &self.fixed
    }
}
