//! Player flight model
//!
//! Turns the polled key state into a new orientation and position for the
//! player once per tick. Rotations are composed in ship space (pitch, then
//! yaw with its bank, then manual roll) onto the authoritative quaternion,
//! which is renormalized every tick. Thrust follows the updated nose.

use crate::config::{FlightConfig, ShipLoadout};
use crate::input::{ControlsConfig, KeyState};
use crate::world::World;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{utils, Quat, Vec3};

/// Outcome of one movement tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementReport {
    /// Thrust was applied this tick
    pub thrusting: bool,
    /// The throttle gear changed this tick
    pub gear_changed: bool,
}

/// Rising-edge double-tap detector on one key
#[derive(Debug, Clone, Copy, Default)]
struct TapDetector {
    was_held: bool,
    last_tap: Option<f32>,
}

impl TapDetector {
    /// Feed the current key state; returns true on the second tap inside `window`
    fn update(&mut self, held: bool, now: f32, window: f32) -> bool {
        let pressed = held && !self.was_held;
        self.was_held = held;
        if !pressed {
            return false;
        }
        match self.last_tap {
            Some(previous) if now - previous <= window => {
                self.last_tap = None;
                true
            }
            _ => {
                self.last_tap = Some(now);
                false
            }
        }
    }
}

/// Integrates player input into orientation and translation
#[derive(Debug, Clone)]
pub struct MovementSystem {
    flight: FlightConfig,
    controls: ControlsConfig,
    speed_multiplier: f32,
    gear: u32,
    throttle: f32,
    sim_time: f32,
    gear_up: TapDetector,
    gear_down: TapDetector,
}

impl MovementSystem {
    /// Create a movement system for a ship with `loadout`
    pub fn new(flight: &FlightConfig, controls: &ControlsConfig, loadout: &ShipLoadout) -> Self {
        Self {
            flight: flight.clone(),
            controls: controls.clone(),
            speed_multiplier: loadout.speed,
            gear: flight.start_gear.min(flight.max_gear),
            throttle: 0.0,
            sim_time: 0.0,
            gear_up: TapDetector::default(),
            gear_down: TapDetector::default(),
        }
    }

    /// Current throttle gear
    pub fn gear(&self) -> u32 {
        self.gear
    }

    /// Smoothed throttle
    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    /// Force the throttle gear, clamped to the configured range
    pub fn set_gear(&mut self, gear: u32) {
        self.gear = gear.min(self.flight.max_gear);
    }

    /// Target throttle for the current gear
    fn target_throttle(&self) -> f32 {
        if self.flight.max_gear == 0 {
            return 0.0;
        }
        self.gear as f32 / self.flight.max_gear as f32 * self.speed_multiplier
    }

    /// Advance the player by one tick
    ///
    /// The player needs transform, velocity and rotation rows; if any is
    /// missing the tick is skipped.
    pub fn update(
        &mut self,
        world: &mut World,
        player: Entity,
        keys: &KeyState,
        dt: f32,
        step_scale: f32,
    ) -> MovementReport {
        self.sim_time += dt;
        let mut report = MovementReport::default();

        if !(world.transform.contains(player) && world.velocity.contains(player)) {
            return report;
        }
        let Some(orientation) = world.rotation.get_mut(player) else {
            return report;
        };

        // Step 1: gear changes on double-tap of the pitch keys
        let window = self.flight.double_tap_window;
        let now = self.sim_time;
        if self.gear_up.update(keys.is_held(&self.controls.pitch_forward), now, window)
            && self.gear < self.flight.max_gear
        {
            self.gear += 1;
            report.gear_changed = true;
        }
        if self.gear_down.update(keys.is_held(&self.controls.pitch_back), now, window) && self.gear > 0 {
            self.gear -= 1;
            report.gear_changed = true;
        }
        if report.gear_changed {
            log::debug!("Throttle gear {}", self.gear);
        }

        // Step 2: compose ship-space rotations
        let pitch_input = keys.axis(&self.controls.pitch_back, &self.controls.pitch_forward);
        let lateral_input = keys.axis(&self.controls.yaw_right, &self.controls.yaw_left);
        let roll_input = keys.axis(&self.controls.roll_left, &self.controls.roll_right);
        let strafing = keys.is_held(&self.controls.strafe_modifier);
        let yaw_input = if strafing { 0.0 } else { lateral_input };

        let pitch = Quat::from_axis_angle(&Vec3::x_axis(), pitch_input * self.flight.pitch_speed * step_scale);
        let yaw = Quat::from_axis_angle(&Vec3::y_axis(), yaw_input * self.flight.yaw_speed * step_scale);
        let bank = Quat::from_axis_angle(&Vec3::z_axis(), -yaw_input * self.flight.bank_speed * step_scale);
        let roll = Quat::from_axis_angle(&Vec3::z_axis(), roll_input * self.flight.roll_speed * step_scale);

        *orientation = *orientation * pitch * (yaw * bank) * roll;
        orientation.renormalize();
        let orientation = *orientation;

        // Step 3: throttle eases toward the gear target
        let target = self.target_throttle();
        self.throttle = utils::lerp(
            self.throttle,
            target,
            utils::smoothing_factor(self.flight.throttle_response, dt),
        );
        if target == 0.0 && self.throttle < 1e-4 {
            self.throttle = 0.0;
        }

        // Step 4: thrust, strafe, friction, then position
        let Some(velocity) = world.velocity.get_mut(player) else {
            return report;
        };
        let forward = orientation * Vec3::z();
        if self.throttle > 0.0 {
            *velocity += forward
                * (self.flight.acceleration * self.throttle * self.flight.thrust_multiplier * step_scale);
            report.thrusting = true;
        }
        if strafing && lateral_input != 0.0 {
            let left = orientation * Vec3::x();
            *velocity += left * (lateral_input * self.flight.strafe_impulse * step_scale);
        }
        *velocity *= utils::damping(self.flight.friction, step_scale);
        let displacement = *velocity * step_scale;

        if let Some(transform) = world.transform.get_mut(player) {
            transform.position += displacement;
            transform.rotation = utils::euler_from_quat(&orientation);
        }

        log::trace!("Player throttle {:.3} gear {}", self.throttle, self.gear);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (World, Entity, MovementSystem) {
        let mut world = World::new();
        let player = world.create_entity();
        world.transform.insert(player, Transform::default());
        world.velocity.insert(player, Vec3::zeros());
        world.rotation.insert(player, Quat::identity());
        let system = MovementSystem::new(
            &FlightConfig::default(),
            &ControlsConfig::default(),
            &ShipLoadout::default(),
        );
        (world, player, system)
    }

    fn run(world: &mut World, player: Entity, system: &mut MovementSystem, keys: &KeyState, ticks: u32) {
        for _ in 0..ticks {
            system.update(world, player, keys, DT, 1.0);
        }
    }

    #[test]
    fn test_missing_rows_is_noop() {
        let (mut world, player, mut system) = setup();
        world.velocity.remove(player);
        let report = system.update(&mut world, player, &KeyState::with_held(["w"]), DT, 1.0);
        assert_eq!(report, MovementReport::default());
        assert_eq!(world.rotation.get(player), Some(&Quat::identity()));
    }

    #[test]
    fn test_quaternion_stays_normalized() {
        let (mut world, player, mut system) = setup();
        let keys = KeyState::with_held(["w", "a", "e"]);
        run(&mut world, player, &mut system, &keys, 5_000);
        let q = world.rotation.get(player).unwrap();
        assert_relative_eq!(q.quaternion().norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pitch_forward_lowers_nose() {
        let (mut world, player, mut system) = setup();
        run(&mut world, player, &mut system, &KeyState::with_held(["w"]), 10);
        let forward = world.rotation.get(player).unwrap() * Vec3::z();
        assert!(forward.y < 0.0);
    }

    #[test]
    fn test_yaw_banks_into_turn() {
        let (mut world, player, mut system) = setup();
        run(&mut world, player, &mut system, &KeyState::with_held(["a"]), 10);
        let q = world.rotation.get(player).unwrap();
        let forward = q * Vec3::z();
        let up = q * Vec3::y();
        // Turning left (+X), the top of the ship tilts toward the turn
        assert!(forward.x > 0.0);
        assert!(up.x > 0.0);
    }

    #[test]
    fn test_double_tap_shifts_gear_and_thrusts() {
        let (mut world, player, mut system) = setup();
        let forward = KeyState::with_held(["w"]);
        let idle = KeyState::new();

        assert!(!system.update(&mut world, player, &idle, DT, 1.0).thrusting);
        system.update(&mut world, player, &forward, DT, 1.0);
        system.update(&mut world, player, &idle, DT, 1.0);
        let report = system.update(&mut world, player, &forward, DT, 1.0);
        assert!(report.gear_changed);
        assert_eq!(system.gear(), 1);

        run(&mut world, player, &mut system, &idle, 120);
        assert!(system.throttle() > 0.0);
        assert!(world.velocity.get(player).unwrap().norm() > 0.0);
    }

    #[test]
    fn test_slow_taps_do_not_shift() {
        let (mut world, player, mut system) = setup();
        let forward = KeyState::with_held(["w"]);
        let idle = KeyState::new();
        system.update(&mut world, player, &forward, DT, 1.0);
        run(&mut world, player, &mut system, &idle, 60);
        system.update(&mut world, player, &forward, DT, 1.0);
        assert_eq!(system.gear(), 0);
    }

    #[test]
    fn test_strafe_only_with_modifier() {
        let (mut world, player, mut system) = setup();
        run(&mut world, player, &mut system, &KeyState::with_held(["shift", "d"]), 10);
        let q = world.rotation.get(player).unwrap();
        assert_relative_eq!(q.angle(), 0.0, epsilon = 1e-6);
        // Right is local -X
        assert!(world.transform.get(player).unwrap().position.x < 0.0);
    }

    #[test]
    fn test_friction_is_step_rate_independent() {
        let (mut world_a, player_a, mut system_a) = setup();
        let (mut world_b, player_b, mut system_b) = setup();
        world_a.velocity.insert(player_a, Vec3::new(0.0, 0.0, 1.0));
        world_b.velocity.insert(player_b, Vec3::new(0.0, 0.0, 1.0));
        let idle = KeyState::new();

        for _ in 0..60 {
            system_a.update(&mut world_a, player_a, &idle, DT, 1.0);
        }
        for _ in 0..30 {
            system_b.update(&mut world_b, player_b, &idle, DT * 2.0, 2.0);
        }
        assert_relative_eq!(
            world_a.velocity.get(player_a).unwrap().z,
            world_b.velocity.get(player_b).unwrap().z,
            epsilon = 1e-4
        );
    }
}
