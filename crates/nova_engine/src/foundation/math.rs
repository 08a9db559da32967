//! Math utilities and types
//!
//! Provides fundamental math types for 3D simulation code.

pub use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Integer 3D vector, used for grid cells
pub type IVec3 = Vector3<i32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Blend factor for frame-rate independent exponential smoothing
    ///
    /// `rate` is the convergence rate in 1/seconds. Feeding the result to
    /// [`lerp`] every step converges at the same wall-clock speed whatever
    /// the step length.
    pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
        if rate <= 0.0 || dt <= 0.0 {
            0.0
        } else {
            1.0 - (-rate * dt).exp()
        }
    }

    /// Per-tick multiplicative damping raised to a step-rate independent exponent
    ///
    /// `factor` is the damping applied over one nominal tick and `step_scale`
    /// is `dt × step_hz`.
    pub fn damping(factor: f32, step_scale: f32) -> f32 {
        factor.clamp(0.0, 1.0).powf(step_scale.max(0.0))
    }

    /// Wrap `value` into `[center - half_extent, center + half_extent)`
    pub fn wrap_around(value: f32, center: f32, half_extent: f32) -> f32 {
        if half_extent <= 0.0 {
            return center;
        }
        let span = half_extent * 2.0;
        let offset = (value - center + half_extent).rem_euclid(span);
        center - half_extent + offset
    }

    /// Quaternion built from the XYZ Euler angles stored in transforms
    pub fn quat_from_euler(rotation: &Vec3) -> Quat {
        Quat::from_euler_angles(rotation.x, rotation.y, rotation.z)
    }

    /// Euler angles (roll, pitch, yaw about X, Y, Z) of a quaternion
    pub fn euler_from_quat(rotation: &Quat) -> Vec3 {
        let (x, y, z) = rotation.euler_angles();
        Vec3::new(x, y, z)
    }

    /// Squared distance from `point` to the segment `start..end`
    pub fn segment_point_distance_sq(start: &Vec3, end: &Vec3, point: &Vec3) -> f32 {
        let (closest, _) = closest_point_on_segment(start, end, point);
        (point - closest).norm_squared()
    }

    /// Closest point on `start..end` to `point` and its segment parameter
    pub fn closest_point_on_segment(start: &Vec3, end: &Vec3, point: &Vec3) -> (Vec3, f32) {
        let segment = end - start;
        let length_sq = segment.norm_squared();
        if length_sq <= f32::EPSILON {
            return (*start, 0.0);
        }
        let t = ((point - start).dot(&segment) / length_sq).clamp(0.0, 1.0);
        (start + segment * t, t)
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_smoothing_factor_is_step_independent() {
        // Two half steps must land where one full step lands
        let full = smoothing_factor(4.0, 0.1);
        let half = smoothing_factor(4.0, 0.05);
        let mut value = 0.0;
        value = lerp(value, 1.0, half);
        value = lerp(value, 1.0, half);
        assert_relative_eq!(value, full, epsilon = 1e-5);
        assert_eq!(smoothing_factor(0.0, 0.1), 0.0);
    }

    #[test]
    fn test_damping_scales_with_step() {
        assert_relative_eq!(damping(0.9, 1.0), 0.9);
        assert_relative_eq!(damping(0.9, 2.0), 0.81, epsilon = 1e-6);
        assert_relative_eq!(damping(0.9, 0.5) * damping(0.9, 0.5), 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_wrap_around() {
        assert_relative_eq!(wrap_around(12.0, 0.0, 10.0), -8.0);
        assert_relative_eq!(wrap_around(-11.0, 0.0, 10.0), 9.0);
        assert_relative_eq!(wrap_around(3.0, 0.0, 10.0), 3.0);
        assert_relative_eq!(wrap_around(105.0, 100.0, 10.0), 105.0);
    }

    #[test]
    fn test_segment_distance() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(0.0, 0.0, 10.0);
        assert_relative_eq!(segment_point_distance_sq(&start, &end, &Vec3::new(2.0, 0.0, 5.0)), 4.0);
        assert_relative_eq!(segment_point_distance_sq(&start, &end, &Vec3::new(0.0, 0.0, 13.0)), 9.0);
        assert_relative_eq!(segment_point_distance_sq(&start, &start, &Vec3::new(1.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_euler_round_trip() {
        let euler = Vec3::new(0.3, -0.4, 0.2);
        let back = euler_from_quat(&quat_from_euler(&euler));
        assert_relative_eq!(back, euler, epsilon = 1e-5);
    }
}
