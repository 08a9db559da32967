//! Chase camera
//!
//! The camera pose is a pure function of the player's pose: no state carries
//! over between ticks. Combat projects candidate targets through the camera
//! the same tick it is positioned.
//!
//! # Coordinate System
//! Right-handed, Y-up world. The camera looks along its local +Z; local +X
//! points to the left of the view, so screen-space X is the negated local X.

use crate::config::CameraConfig;
use crate::world::World;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{utils, Quat, Vec3};

/// Projected point in normalized device coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Horizontal NDC, `-1` left edge to `+1` right edge
    pub x: f32,
    /// Vertical NDC, `-1` bottom to `+1` top
    pub y: f32,
    /// Distance along the view axis
    pub depth: f32,
}

impl ScreenPoint {
    /// Distance from the screen center
    pub fn center_distance(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Whether the point lies inside the `[-margin, margin]` NDC box
    pub fn within(&self, margin: f32) -> bool {
        self.x.abs() <= margin && self.y.abs() <= margin
    }
}

/// Perspective camera pose and projection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Camera orientation; the view axis is local +Z
    pub orientation: Quat,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Distance to near clipping plane
    pub near: f32,
    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Camera at the origin looking down +Z
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            fov: utils::deg_to_rad(config.fov_degrees),
            aspect: config.aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// View direction
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::z()
    }

    /// Project a world-space point
    ///
    /// Returns `None` for points on or behind the near plane or past the far
    /// plane; points outside the viewport still project so callers can apply
    /// their own margins.
    pub fn project(&self, point: &Vec3) -> Option<ScreenPoint> {
        let local = self.orientation.inverse_transform_vector(&(point - self.position));
        if local.z <= self.near || local.z > self.far {
            return None;
        }
        let half_height = (self.fov * 0.5).tan() * local.z;
        if half_height <= f32::EPSILON {
            return None;
        }
        Some(ScreenPoint {
            x: -local.x / (half_height * self.aspect),
            y: local.y / half_height,
            depth: local.z,
        })
    }
}

/// Derives the camera from the player's pose each tick
#[derive(Debug, Clone)]
pub struct CameraSystem {
    camera: Camera,
    follow_offset: Vec3,
}

impl CameraSystem {
    /// Create a camera system from config
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            camera: Camera::new(config),
            follow_offset: config.follow_offset,
        }
    }

    /// Current camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Place the camera behind the player
    ///
    /// A player without a transform leaves the camera where it was.
    pub fn update(&mut self, world: &World, player: Entity) {
        let Some(transform) = world.transform.get(player) else {
            return;
        };
        let orientation = world
            .rotation
            .get(player)
            .copied()
            .unwrap_or_else(|| utils::quat_from_euler(&transform.rotation));

        self.camera.orientation = orientation;
        self.camera.position = transform.position + orientation * self.follow_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new(&CameraConfig::default())
    }

    #[test]
    fn test_point_ahead_projects_to_center() {
        let screen = camera().project(&Vec3::new(0.0, 0.0, 50.0)).unwrap();
        assert_relative_eq!(screen.x, 0.0);
        assert_relative_eq!(screen.y, 0.0);
        assert_relative_eq!(screen.depth, 50.0);
    }

    #[test]
    fn test_point_behind_does_not_project() {
        assert!(camera().project(&Vec3::new(0.0, 0.0, -10.0)).is_none());
        assert!(camera().project(&Vec3::new(0.0, 0.0, 0.05)).is_none());
    }

    #[test]
    fn test_point_past_far_plane_is_clipped() {
        let cam = camera();
        assert!(cam.project(&Vec3::new(0.0, 0.0, cam.far)).is_some());
        assert!(cam.project(&Vec3::new(0.0, 0.0, cam.far + 1.0)).is_none());
    }

    #[test]
    fn test_screen_axes() {
        let cam = camera();
        // Local -X is to the right of the view
        let right = cam.project(&Vec3::new(-5.0, 0.0, 50.0)).unwrap();
        assert!(right.x > 0.0);
        let up = cam.project(&Vec3::new(0.0, 5.0, 50.0)).unwrap();
        assert!(up.y > 0.0);
    }

    #[test]
    fn test_follows_player_orientation() {
        let mut world = World::new();
        let player = world.create_entity();
        world
            .transform
            .insert(player, Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let yaw = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        world.rotation.insert(player, yaw);

        let config = CameraConfig::default();
        let mut system = CameraSystem::new(&config);
        system.update(&world, player);

        let expected = Vec3::new(10.0, 0.0, 0.0) + yaw * config.follow_offset;
        assert_relative_eq!(system.camera().position, expected, epsilon = 1e-5);
        assert_relative_eq!(system.camera().forward(), Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_missing_player_keeps_pose() {
        let world = World::new();
        let mut system = CameraSystem::new(&CameraConfig::default());
        system.update(&world, Entity::from_raw(99));
        assert_eq!(system.camera().position, Vec3::zeros());
    }
}
