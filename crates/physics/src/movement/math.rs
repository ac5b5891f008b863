//! Small vector helpers shared by the mechanics.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};

/// Move `value` toward `target` by at most `delta`.
#[inline]
pub fn approach(value: f32, target: f32, delta: f32) -> f32 {
    if value < target {
        (value + delta).min(target)
    } else {
        (value - delta).max(target)
    }
}

/// Shrink a vector's length toward `target` by at most `delta`, keeping its direction.
pub fn approach_length(v: Vec3, target: f32, delta: f32) -> Vec3 {
    let length = v.length();
    if length <= f32::EPSILON {
        return v;
    }
    v * (approach(length, target, delta) / length)
}

/// Move a point toward `target` by at most `delta`.
pub fn approach_point(from: Vec3, target: Vec3, delta: f32) -> Vec3 {
    let offset = target - from;
    let distance = offset.length();
    if distance <= delta {
        return target;
    }
    from + offset * (delta / distance)
}

#[inline]
pub fn smoothstep(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Remove the component of `v` along the unit vector `normal`.
#[inline]
pub fn reject(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Rotate unit vector `from` toward `to` by at most `max_angle` radians.
pub fn rotate_towards(from: Vec3, to: Vec3, max_angle: f32) -> Vec3 {
    let angle = from.dot(to).clamp(-1.0, 1.0).acos();
    if angle <= max_angle || angle <= f32::EPSILON {
        return to;
    }

    let axis = from.cross(to);
    let axis = if axis.length_squared() > 1.0e-8 {
        axis.normalize()
    } else {
        // Opposite vectors: any perpendicular axis will do.
        from.any_orthonormal_vector()
    };

    Quat::from_axis_angle(axis, max_angle) * from
}
