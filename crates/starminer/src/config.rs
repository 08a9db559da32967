//! Game configuration
//!
//! Every tuning constant the simulation reads lives here. All sections use
//! `#[serde(default)]`, so a config file only needs the values it changes.
//! Per-tick quantities (speeds, impulses, damping factors) are expressed for
//! one nominal tick at `simulation.step_hz`; systems rescale them by
//! `dt × step_hz`.

use crate::components::ObjectKind;
use crate::input::ControlsConfig;
use nova_engine::config::{Config, ConfigError};
use nova_engine::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Top-level game configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed-step loop settings
    pub simulation: SimulationConfig,
    /// Ship loadout chosen before launch
    pub loadout: ShipLoadout,
    /// Flight model
    pub flight: FlightConfig,
    /// Weapons and projectiles
    pub combat: CombatConfig,
    /// Target lock and crosshair
    pub lock: LockConfig,
    /// Chase camera
    pub camera: CameraConfig,
    /// Voxel carving and mesh rebuild throttling
    pub voxel: VoxelConfig,
    /// Pickups, magnet and cargo
    pub loot: LootConfig,
    /// Particle effects
    pub vfx: VfxConfig,
    /// Home base, ambient field, object field
    pub world: WorldConfig,
    /// Key bindings
    pub controls: ControlsConfig,
}

impl Config for GameConfig {}

impl GameConfig {
    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| Err(ConfigError::Invalid(reason.to_string()));

        if self.simulation.step_hz <= 0.0 {
            return invalid("simulation.step_hz must be positive");
        }
        if self.simulation.max_sub_steps == 0 {
            return invalid("simulation.max_sub_steps must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.flight.friction) {
            return invalid("flight.friction must be within [0, 1]");
        }
        if self.flight.start_gear > self.flight.max_gear {
            return invalid("flight.start_gear exceeds flight.max_gear");
        }
        if self.lock.acquire_radius >= self.lock.keep_radius {
            return invalid("lock.acquire_radius must be smaller than lock.keep_radius");
        }
        if self.voxel.min_voxels_per_hit == 0 || self.voxel.min_voxels_per_hit > self.voxel.max_voxels_per_hit {
            return invalid("voxel per-hit bounds must satisfy 1 <= min <= max");
        }
        if self.loot.collect_range >= self.loot.magnet_range {
            return invalid("loot.collect_range must be inside loot.magnet_range");
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return invalid("camera clip planes must satisfy 0 < near < far");
        }
        Ok(())
    }
}

/// Fixed-step loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation rate in steps per second
    pub step_hz: f64,
    /// Maximum steps executed per frame
    pub max_sub_steps: u32,
    /// Clamp applied to a single frame's elapsed time (seconds)
    pub max_frame_time: f64,
    /// Seed for scatter randomness
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_hz: 60.0,
            max_sub_steps: 5,
            max_frame_time: 0.25,
            seed: 0x5EED_CAFE,
        }
    }
}

/// Ship loadout stats, read-only for the duration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipLoadout {
    /// Damage dealt per projectile
    pub weapon_power: f32,
    /// Multiplier on gear target speed
    pub speed: f32,
    /// Cargo units the hold can carry
    pub storage_capacity: u32,
    /// Energy pool drained by firing
    pub max_energy: f32,
}

impl Default for ShipLoadout {
    fn default() -> Self {
        Self {
            weapon_power: 10.0,
            speed: 1.0,
            storage_capacity: 20,
            max_energy: 100.0,
        }
    }
}

/// Flight model constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Pitch rate (radians per tick)
    pub pitch_speed: f32,
    /// Yaw rate (radians per tick)
    pub yaw_speed: f32,
    /// Manual roll rate (radians per tick)
    pub roll_speed: f32,
    /// Roll applied while yawing (radians per tick)
    pub bank_speed: f32,
    /// Thrust acceleration per tick at full throttle
    pub acceleration: f32,
    /// Fixed scale applied on top of acceleration
    pub thrust_multiplier: f32,
    /// Velocity kept per tick
    pub friction: f32,
    /// Throttle convergence rate toward the gear target (1/s)
    pub throttle_response: f32,
    /// Highest throttle gear
    pub max_gear: u32,
    /// Gear at launch
    pub start_gear: u32,
    /// Window for double-tap gear changes (seconds)
    pub double_tap_window: f32,
    /// Lateral impulse per tick while strafing
    pub strafe_impulse: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            pitch_speed: 0.025,
            yaw_speed: 0.02,
            roll_speed: 0.03,
            bank_speed: 0.012,
            acceleration: 0.04,
            thrust_multiplier: 0.5,
            friction: 0.97,
            throttle_response: 3.0,
            max_gear: 4,
            start_gear: 0,
            double_tap_window: 0.3,
            strafe_impulse: 0.03,
        }
    }
}

/// Which objects a locked shot may pass through to reach its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccluderPolicy {
    /// Every projectile hits the first object in its path
    Solid,
    /// Shots locked onto a planet ignore everything else
    PierceForLockedPlanets,
    /// Shots locked onto any target ignore everything else
    PierceForLocked,
}

impl OccluderPolicy {
    /// Whether a shot locked onto an object of `kind` ignores other objects
    pub fn pierces_for(self, kind: ObjectKind) -> bool {
        match self {
            Self::Solid => false,
            Self::PierceForLockedPlanets => kind == ObjectKind::Planet,
            Self::PierceForLocked => true,
        }
    }
}

/// Weapons and projectiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Minimum wall-clock interval between shots (seconds)
    pub fire_interval: f64,
    /// Energy consumed per shot
    pub energy_cost: f32,
    /// Energy regained per second of simulation
    pub energy_regen_per_sec: f32,
    /// Projectile speed (units per tick)
    pub projectile_speed: f32,
    /// Projectile lifetime (seconds)
    pub projectile_life: f32,
    /// Muzzle position in ship space
    pub muzzle_offset: Vec3,
    /// Unscaled collision radius of asteroid geometry
    pub asteroid_bounding_radius: f32,
    /// Unscaled collision radius of planet geometry
    pub planet_bounding_radius: f32,
    /// Locked-shot occluder policy
    pub occluder_policy: OccluderPolicy,
    /// Duration of the hit highlight (seconds)
    pub hit_flash_secs: f32,
}

impl CombatConfig {
    /// Unscaled collision radius for an object kind
    pub fn bounding_radius(&self, kind: ObjectKind) -> f32 {
        match kind {
            ObjectKind::Asteroid => self.asteroid_bounding_radius,
            ObjectKind::Planet => self.planet_bounding_radius,
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            fire_interval: 0.18,
            energy_cost: 4.0,
            energy_regen_per_sec: 6.0,
            projectile_speed: 4.0,
            projectile_life: 1.5,
            muzzle_offset: Vec3::new(0.0, -0.4, 2.0),
            asteroid_bounding_radius: 1.0,
            planet_bounding_radius: 1.0,
            occluder_policy: OccluderPolicy::Solid,
            hit_flash_secs: 0.08,
        }
    }
}

/// Target lock tuning; screen values are in normalized device coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Farthest lockable distance
    pub max_range: f32,
    /// Half-angle of the forward acquisition cone (degrees)
    pub cone_degrees: f32,
    /// Candidates must project inside this NDC box
    pub screen_margin: f32,
    /// Screen distance from center within which a target can be acquired
    pub acquire_radius: f32,
    /// Looser screen distance within which a held lock is kept
    pub keep_radius: f32,
    /// Delay after an unlock before a new target can be acquired (seconds)
    pub reacquire_cooldown: f32,
    /// Weight of screen-center distance in the acquisition score
    pub weight_screen: f32,
    /// Weight of normalized world distance
    pub weight_distance: f32,
    /// Weight of normalized cone angle
    pub weight_angle: f32,
    /// Bonus weight favoring large or near objects
    pub weight_size: f32,
    /// Crosshair convergence rate at zero depth (1/s)
    pub crosshair_rate: f32,
    /// Extra pull toward screen center for targets at max range
    pub crosshair_depth_pull: f32,
    /// Fraction of the crosshair rate removed for targets at max range
    pub crosshair_depth_smoothing: f32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_range: 500.0,
            cone_degrees: 30.0,
            screen_margin: 0.92,
            acquire_radius: 0.3,
            keep_radius: 0.55,
            reacquire_cooldown: 0.2,
            weight_screen: 1.0,
            weight_distance: 0.6,
            weight_angle: 0.4,
            weight_size: 0.3,
            crosshair_rate: 14.0,
            crosshair_depth_pull: 0.35,
            crosshair_depth_smoothing: 0.5,
        }
    }
}

/// Chase camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position in ship space
    pub follow_offset: Vec3,
    /// Vertical field of view (degrees)
    pub fov_degrees: f32,
    /// Viewport width / height
    pub aspect: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_offset: Vec3::new(0.0, 2.5, -9.0),
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

/// Voxel carving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelConfig {
    /// Fewest voxels removed by a registered hit
    pub min_voxels_per_hit: usize,
    /// Most voxels removed by a single hit
    pub max_voxels_per_hit: usize,
    /// Largest search shell around the hit cell
    pub max_search_radius: i32,
    /// Minimum seconds between mesh rebuilds of one object
    pub rebuild_interval: f32,
    /// Extra rebuild interval per unit of object scale
    pub rebuild_interval_per_scale: f32,
    /// Rebuilds processed per tick
    pub max_rebuilds_per_tick: usize,
    /// Credits carried by a gem carved out of a resource voxel
    pub resource_loot_value: f32,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            min_voxels_per_hit: 1,
            max_voxels_per_hit: 18,
            max_search_radius: 6,
            rebuild_interval: 0.12,
            rebuild_interval_per_scale: 0.02,
            max_rebuilds_per_tick: 3,
            resource_loot_value: 2.0,
        }
    }
}

/// Pickups and cargo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    /// Velocity kept per tick while drifting
    pub drag: f32,
    /// Float sinusoid amplitude
    pub float_amplitude: f32,
    /// Float sinusoid angular frequency (radians per second)
    pub float_frequency: f32,
    /// Distance at which the magnet starts pulling
    pub magnet_range: f32,
    /// Pull per tick at zero distance
    pub magnet_strength: f32,
    /// Distance at which pickups start shrinking
    pub consume_range: f32,
    /// Smallest scale fraction while shrinking
    pub min_consume_scale: f32,
    /// Distance at which pickups are collected
    pub collect_range: f32,
    /// Minimum seconds between "storage full" messages
    pub full_notice_interval: f32,
    /// Credits per coin dropped by destroyed objects
    pub coin_value: f32,
    /// Cap on coins dropped by one object
    pub max_drops_per_object: u32,
    /// Initial scatter speed of dropped loot (units per tick)
    pub scatter_speed: f32,
    /// Render scale of a pickup
    pub pickup_scale: f32,
    /// Free loot render handles kept for reuse
    pub pool_capacity: usize,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            drag: 0.96,
            float_amplitude: 0.35,
            float_frequency: 1.6,
            magnet_range: 18.0,
            magnet_strength: 0.05,
            consume_range: 5.0,
            min_consume_scale: 0.35,
            collect_range: 2.0,
            full_notice_interval: 1.5,
            coin_value: 5.0,
            max_drops_per_object: 8,
            scatter_speed: 0.15,
            pickup_scale: 0.6,
            pool_capacity: 64,
        }
    }
}

/// Particle effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfxConfig {
    /// Free render handles kept per particle kind
    pub pool_capacity: usize,
    /// Seconds between engine trail puffs while thrusting
    pub trail_interval: f32,
    /// Trail puff lifetime (seconds)
    pub trail_life: f32,
    /// Sparks per projectile hit
    pub spark_count: u32,
    /// Spark lifetime (seconds)
    pub spark_life: f32,
    /// Spark speed (units per tick)
    pub spark_speed: f32,
    /// Fireball lifetime (seconds)
    pub fireball_life: f32,
    /// Smoke puffs per explosion
    pub smoke_count: u32,
    /// Smoke lifetime (seconds)
    pub smoke_life: f32,
    /// Debris cubes per explosion
    pub debris_count: u32,
    /// Debris lifetime (seconds)
    pub debris_life: f32,
    /// Debris speed (units per tick)
    pub debris_speed: f32,
    /// Velocity kept per tick by particles
    pub particle_drag: f32,
}

impl Default for VfxConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 128,
            trail_interval: 0.03,
            trail_life: 0.6,
            spark_count: 6,
            spark_life: 0.35,
            spark_speed: 0.6,
            fireball_life: 0.6,
            smoke_count: 4,
            smoke_life: 1.4,
            debris_count: 8,
            debris_life: 1.2,
            debris_speed: 0.35,
            particle_drag: 0.95,
        }
    }
}

/// World layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Home base position
    pub base_position: Vec3,
    /// Distance from the base at which cargo is deposited
    pub base_radius: f32,
    /// Ambient dust motes wrapped around the player
    pub ambient_count: usize,
    /// Half-size of the cube the ambient field wraps within
    pub ambient_half_extent: f32,
    /// Asteroids placed by field seeding
    pub field_asteroids: u32,
    /// Planets placed by field seeding
    pub field_planets: u32,
    /// Radius of the seeded field around the origin
    pub field_radius: f32,
    /// Keep seeded objects at least this far from the base
    pub field_clearance: f32,
    /// Free projectile render handles kept for reuse
    pub projectile_pool_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            base_position: Vec3::new(0.0, 0.0, -150.0),
            base_radius: 25.0,
            ambient_count: 64,
            ambient_half_extent: 120.0,
            field_asteroids: 24,
            field_planets: 2,
            field_radius: 600.0,
            field_clearance: 80.0,
            projectile_pool_capacity: 64,
        }
    }
}
