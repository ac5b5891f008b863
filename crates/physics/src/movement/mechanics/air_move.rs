//! Airborne movement with Quake-style air control.

use glam::Vec3;

use crate::movement::context::MechanicContext;
use crate::movement::mechanic::{Mechanic, MechanicId, MechanicTimers};
use crate::movement::state::MechanicTags;

#[derive(Debug, Clone, Copy, Default)]
pub struct AirMove;

impl Mechanic for AirMove {
    fn id(&self) -> MechanicId {
        MechanicId::AirMove
    }

    fn priority(&self) -> i32 {
        7
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, _timers: &MechanicTimers) -> bool {
        !ctx.state.is_grounded() && ctx.wall_normal().is_none()
    }

    fn on_active_update(&mut self, ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {
        air_move(ctx);
    }

    fn tags(&self, _ctx: &MechanicContext<'_>) -> MechanicTags {
        MechanicTags::AIRMOVE
    }

    fn speed(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        Some(ctx.config.air_speed)
    }
}

/// One tick of falling. Gravity is split around the move so a jump's
/// height does not depend on the tick rate.
pub(crate) fn air_move(ctx: &mut MechanicContext<'_>) {
    let dt = ctx.dt();
    let half_gravity = 0.5 * ctx.player_gravity() * dt;

    ctx.state.velocity.y -= half_gravity;
    ctx.state.velocity = air_accelerate(ctx, ctx.state.velocity, dt);

    ctx.move_air();

    ctx.state.velocity.y -= half_gravity;
    ctx.categorize_position(ctx.state.is_grounded());
    ctx.mark_integrated();
}

/// Air acceleration only limits speed gained along the wish direction,
/// which is what allows strafe jumping. Ability overrides replace the air
/// speed and acceleration.
fn air_accelerate(ctx: &MechanicContext<'_>, velocity: Vec3, dt: f32) -> Vec3 {
    let wish_dir = ctx.wish_dir();
    let config = ctx.config;
    let overrides = ctx.state.ability_overrides;
    let wish_speed = overrides.speed.unwrap_or(config.air_speed);
    let acceleration = overrides.acceleration.unwrap_or(config.air_acceleration);

    let current_speed = ctx.state.horizontal_velocity().dot(wish_dir);
    let add_speed = (wish_speed - current_speed).max(config.extra_air_acceleration * dt);
    let accel_speed = (acceleration * dt).min(add_speed);

    velocity + wish_dir * accel_speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::mechanics::fixture::Fixture;
    use crate::movement::state::AbilityOverrides;

    #[test]
    fn test_air_move_active_when_airborne() {
        let mut fixture = Fixture::on_floor();
        let timers = MechanicTimers::default();
        assert!(!AirMove.should_become_active(&fixture.ctx(), &timers));

        fixture.state.ground_entity = None;
        assert!(AirMove.should_become_active(&fixture.ctx(), &timers));

        fixture.state.wallrun.set_wall_normal(Some(Vec3::X));
        assert!(!AirMove.should_become_active(&fixture.ctx(), &timers), "wall-running instead");
    }

    #[test]
    fn test_air_move_falls_and_lands() {
        let mut fixture = Fixture::on_floor();
        fixture.state.ground_entity = None;
        fixture.state.position.y = 50.0;

        let mut landed = false;
        for _ in 0..128 {
            fixture.advance(1);
            let mut ctx = fixture.ctx();
            air_move(&mut ctx);
            if ctx.state.is_grounded() {
                landed = !ctx.take_events().is_empty();
                break;
            }
        }

        assert!(landed, "landing raises an event");
        assert!(fixture.state.position.y.abs() < 0.1);
        assert_eq!(fixture.state.velocity.y, 0.0);
    }

    #[test]
    fn test_air_strafe_keeps_speed_above_air_speed() {
        let mut fixture = Fixture::on_floor();
        fixture.state.ground_entity = None;
        fixture.state.position.y = 500.0;
        fixture.state.velocity = Vec3::new(300.0, 0.0, 0.0);
        fixture.cmd.right_move = 1.0;

        fixture.advance(1);
        air_move(&mut fixture.ctx());

        let horizontal = fixture.state.horizontal_velocity();
        assert!(horizontal.x > 299.0, "forward speed kept");
        assert!(horizontal.z > 0.0, "strafe to the right adds sideways speed");
        assert!(fixture.state.velocity.y < 0.0, "gravity applied");
    }

    #[test]
    fn test_ability_overrides_air_control() {
        let strafe_speed = |overrides: AbilityOverrides| {
            let mut fixture = Fixture::on_floor();
            fixture.state.ground_entity = None;
            fixture.state.position.y = 500.0;
            fixture.state.ability_overrides = overrides;
            fixture.cmd.right_move = 1.0;

            fixture.advance(1);
            air_move(&mut fixture.ctx());
            (fixture.state.velocity.z, fixture.state.velocity.y)
        };

        let (plain, plain_fall) = strafe_speed(AbilityOverrides::default());
        let (boosted, boosted_fall) = strafe_speed(AbilityOverrides {
            speed: Some(300.0),
            acceleration: Some(2000.0),
            gravity_scale: Some(0.25),
        });

        assert!((plain - 500.0 / 64.0).abs() < 0.01, "plain strafe {plain}");
        assert!((boosted - 2000.0 / 64.0).abs() < 0.01, "boosted strafe {boosted}");
        assert!(boosted_fall > plain_fall, "lighter gravity falls slower");
    }
}
