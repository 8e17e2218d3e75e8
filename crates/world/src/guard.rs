//! Pure numeric-safety functions applied every tick and on mutating
//! commands. No state, no engine types.

use bodyspace_common::{Pose, Velocities};
use nalgebra::Vector3;

/// Rescale `v` so its magnitude does not exceed `max`, preserving
/// direction. Non-positive `max` leaves the vector untouched.
pub fn clamp_magnitude(v: Vector3<f32>, max: f32) -> Vector3<f32> {
    if max <= 0.0 {
        return v;
    }
    let len = v.norm();
    if len > max { v * (max / len) } else { v }
}

/// Cap a linear velocity at a maximum speed, preserving direction.
///
/// Same math as [`clamp_magnitude`]; a separate name keeps call sites
/// honest about what is being limited.
pub fn clamp_speed(velocity: Vector3<f32>, max_speed: f32) -> Vector3<f32> {
    clamp_magnitude(velocity, max_speed)
}

/// Recover from non-finite simulated state.
///
/// If any component of the pose or velocities is NaN or infinite, returns
/// the origin pose, zeroed velocities, and `true`; otherwise returns the
/// inputs unchanged and `false`.
pub fn sanitize(pose: Pose, velocities: Velocities) -> (Pose, Velocities, bool) {
    let finite = pose.position.iter().all(|c| c.is_finite())
        && pose.rotation.coords.iter().all(|c| c.is_finite())
        && velocities.linear.iter().all(|c| c.is_finite())
        && velocities.angular.iter().all(|c| c.is_finite());
    if finite {
        (pose, velocities, false)
    } else {
        (Pose::default(), Velocities::default(), true)
    }
}
