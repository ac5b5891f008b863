//! Ground movement.

use glam::Vec3;

use crate::movement::context::MechanicContext;
use crate::movement::mechanic::{Mechanic, MechanicId, MechanicTimers};
use crate::movement::state::MechanicTags;

use super::accelerate;

/// Deceleration toward the wish direction is this fraction of the acceleration.
const DECELERATION_SCALE: f32 = 0.6;

/// Accelerates along the ground, steps up ledges and sticks to slopes going down.
#[derive(Debug, Clone, Copy, Default)]
pub struct Walk;

impl Mechanic for Walk {
    fn id(&self) -> MechanicId {
        MechanicId::Walk
    }

    fn priority(&self) -> i32 {
        9
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, _timers: &MechanicTimers) -> bool {
        ctx.state.is_grounded()
    }

    fn on_active_update(&mut self, ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {
        ground_move(ctx);
    }

    fn tags(&self, _ctx: &MechanicContext<'_>) -> MechanicTags {
        MechanicTags::WALK
    }
}

/// One tick of walking. Also used as the fallback move while grounded.
pub(crate) fn ground_move(ctx: &mut MechanicContext<'_>) {
    if !ctx.state.is_grounded() {
        return;
    }

    let dt = ctx.dt();
    let wish_dir = ctx.wish_dir();
    let wish_speed = ctx.wish_speed();
    let acceleration = ctx
        .state
        .overrides
        .acceleration
        .unwrap_or(ctx.config.acceleration);

    let mut velocity = ctx.state.horizontal_velocity();
    velocity = decelerate(velocity, wish_dir, wish_speed, acceleration * DECELERATION_SCALE, dt);
    velocity = accelerate(velocity, wish_dir, wish_speed, acceleration, dt);
    ctx.state.velocity = velocity;

    if velocity.length_squared() < 1.0 {
        ctx.state.velocity = Vec3::ZERO;
    } else {
        let position = ctx.state.position;
        let destination = position + velocity * dt;
        let tr = ctx.sweep(position, destination);

        if tr.fraction >= 1.0 {
            ctx.state.position = tr.end_position;
        } else {
            let step = ctx.step_move(Vec3::Y);
            ctx.add_step_offset(Vec3::NEG_Y * step);
        }
        stay_on_ground(ctx);
    }

    ctx.categorize_position(true);
    ctx.mark_integrated();
}

/// Pull the velocity toward its projection on the wish direction.
fn decelerate(velocity: Vec3, wish_dir: Vec3, wish_speed: f32, deceleration: f32, dt: f32) -> Vec3 {
    let projected = wish_dir * wish_speed.min(velocity.dot(wish_dir));
    velocity + (projected - velocity).clamp_length_max(deceleration * dt)
}

/// Follow the ground down slopes and small drops.
fn stay_on_ground(ctx: &mut MechanicContext<'_>) {
    let position = ctx.state.position;
    let lifted = ctx.sweep(position, position + Vec3::Y * 2.0).end_position;

    let tr = ctx.sweep(lifted, position - Vec3::Y * ctx.config.step_height_max);
    if tr.fraction <= 0.0 || tr.fraction >= 1.0 || tr.started_in_solid {
        return;
    }

    match tr.hit_normal {
        Some(normal) if ctx.is_floor(normal) => ctx.state.position = tr.end_position,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::ContentFlags;
    use crate::movement::mechanics::fixture::Fixture;

    #[test]
    fn test_walk_active_only_grounded() {
        let mut fixture = Fixture::on_floor();
        let timers = MechanicTimers::default();
        assert!(Walk.should_become_active(&fixture.ctx(), &timers));

        fixture.state.ground_entity = None;
        assert!(!Walk.should_become_active(&fixture.ctx(), &timers));
    }

    #[test]
    fn test_walk_reaches_walk_speed() {
        let mut fixture = Fixture::on_floor();
        fixture.cmd.forward_move = 1.0;

        for _ in 0..64 {
            fixture.advance(1);
            let mut ctx = fixture.ctx();
            ground_move(&mut ctx);
            assert!(ctx.is_integrated());
        }

        let speed = fixture.state.horizontal_velocity().length();
        assert!((speed - fixture.config.walk_speed).abs() < 0.5, "speed {speed}");
        assert!(fixture.state.position.x > 100.0, "moved forward along +X");
        assert!(fixture.state.is_grounded());
    }

    #[test]
    fn test_walk_stops_without_input() {
        let mut fixture = Fixture::on_floor();
        fixture.state.velocity = Vec3::new(100.0, 0.0, 0.0);

        for _ in 0..64 {
            fixture.advance(1);
            ground_move(&mut fixture.ctx());
        }

        assert_eq!(fixture.state.velocity, Vec3::ZERO, "friction brings us to rest");
    }

    #[test]
    fn test_walk_steps_up_ledge() {
        let mut fixture = Fixture::on_floor();
        fixture.world.add_box(
            Vec3::new(100.0, 6.0, 0.0),
            Vec3::new(60.0, 6.0, 100.0),
            ContentFlags::SOLID,
        );
        fixture.cmd.forward_move = 1.0;
        fixture.state.velocity = Vec3::new(fixture.config.walk_speed, 0.0, 0.0);

        for _ in 0..32 {
            fixture.advance(1);
            ground_move(&mut fixture.ctx());
        }

        assert!(
            (fixture.state.position.y - 12.0).abs() < 0.5,
            "stands on the 12 unit ledge, y = {}",
            fixture.state.position.y
        );
        assert!(fixture.state.step_smoothing_offset.y < 0.0, "step adds a downward view offset");
    }
}
