//! The built-in movement mechanics.
//!
//! | Mechanic | Priority | Tags |
//! |----------|----------|------|
//! | Crouch   | 0  | crouch |
//! | Jump     | 1  | jump / airjump / walljump on the tick of the jump |
//! | AirMove  | 7  | airmove |
//! | Walk     | 9  | walk |
//! | Slide    | 15 | slide |
//! | Wallrun  | 28 | wallrun |
//! | Sprint   | 70 | sprint |

pub mod air_move;
pub mod crouch;
pub mod jump;
pub mod slide;
pub mod sprint;
pub mod walk;
pub mod wallrun;

pub use air_move::AirMove;
pub use crouch::Crouch;
pub use jump::Jump;
pub use slide::Slide;
pub use sprint::Sprint;
pub use walk::Walk;
pub use wallrun::Wallrun;

use glam::Vec3;

/// Quake-style acceleration toward `wish_dir`, never pushing speed past
/// `max(wish_speed, current speed)`.
pub(crate) fn accelerate(velocity: Vec3, wish_dir: Vec3, wish_speed: f32, acceleration: f32, dt: f32) -> Vec3 {
    let current_speed = velocity.dot(wish_dir);
    let add_speed = (wish_speed - current_speed).max(0.0);
    let accel_speed = (acceleration * dt).min(add_speed);

    let magnitude_squared = (wish_speed * wish_speed).max(velocity.length_squared());

    (velocity + wish_dir * accel_speed).clamp_length_max(magnitude_squared.sqrt())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accelerate_caps_at_wish_speed() {
        let mut velocity = Vec3::ZERO;
        for _ in 0..1000 {
            velocity = accelerate(velocity, Vec3::X, 100.0, 1000.0, 1.0 / 64.0);
        }
        assert!((velocity.x - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_accelerate_keeps_excess_speed() {
        let velocity = accelerate(Vec3::new(300.0, 0.0, 0.0), Vec3::Z, 100.0, 1000.0, 1.0 / 64.0);
        assert!((velocity.length() - 300.0).abs() < 0.01, "turning does not add speed");
        assert!(velocity.z > 0.0);
    }
}
