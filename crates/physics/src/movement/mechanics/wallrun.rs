//! Wall-running.
//!
//! The wall normal is the whole state machine: while it is set and we are
//! airborne, we wall-run. It gets set when an air move touches an eligible
//! wall, follows the wall as it curves, and is cleared when we fall away,
//! jump, land or lose the wall.
//!
//! A wall is eligible when the lower half of the hull touches it, it is not
//! the side of a step, and it is not a repeat of the wall we last started on
//! from higher up. Runs on a repeated wall, or started without jumping, are
//! weak: full gravity from the start and no up boost.

use glam::Vec3;

use crate::movement::command::CommandButtons;
use crate::movement::context::MechanicContext;
use crate::movement::math::{flatten, reject, rotate_towards, wrap_angle};
use crate::movement::mechanic::{Mechanic, MechanicId, MechanicTimers};
use crate::movement::state::{yaw_of, MechanicTags};

/// Looking closer than this to straight into or out of the wall turns forward input into climbing.
const CLIMB_LOOK_DOT: f32 = 0.71;

/// Input this far along the wall normal counts as pushing away.
const PUSH_AWAY_DOT: f32 = 0.71;

/// Wish directions this far behind the view count as running backwards.
const BACKWARDS_DOT: f32 = -0.65;

/// Height of the probes that look for the top of a wall or a step.
const TOP_PROBE_HEIGHT: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eligibility {
    Ineligible,
    Eligible,
    Weak,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Wallrun;

impl Mechanic for Wallrun {
    fn id(&self) -> MechanicId {
        MechanicId::Wallrun
    }

    fn priority(&self) -> i32 {
        28
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, _timers: &MechanicTimers) -> bool {
        ctx.config.wallrun_enabled && !ctx.state.is_grounded() && ctx.wall_normal().is_some()
    }

    fn simulate(&mut self, ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {
        let predicted = if !ctx.state.is_active(MechanicId::Wallrun) && !ctx.state.is_grounded() {
            predict(ctx, ctx.config.wallrun_tilt_predict_time)
        } else {
            None
        };
        ctx.state.wallrun.predicted_wall_normal = predicted;
    }

    fn on_active_changed(
        &mut self,
        _before: bool,
        after: bool,
        ctx: &mut MechanicContext<'_>,
        _timers: &MechanicTimers,
    ) {
        ctx.state.wallrun.not_pushing_away = ctx.now();

        if !after {
            ctx.state.wallrun.clear();
            return;
        }

        ctx.state.jump.air_jumps_remaining = ctx.config.air_jump_max_jumps;
        ctx.state.wallrun.last_start_pos = Some(ctx.state.position);

        if ctx.state.wallrun.has_boost {
            ctx.state.wallrun.has_boost = false;

            let boost = ctx.config.wallrun_up_wall_boost;
            ctx.state.velocity.y += (boost - ctx.state.velocity.y).clamp(0.0, boost);
        }

        log::trace!(
            "wallrun start at {:?}, weak {}",
            ctx.state.position,
            ctx.state.wallrun.weak
        );
    }

    fn on_active_update(&mut self, ctx: &mut MechanicContext<'_>, timers: &MechanicTimers) {
        let Some(wall_normal) = ctx.wall_normal() else {
            return;
        };

        wallrun_move(ctx, wall_normal, timers);
        categorize(ctx, timers);
        ctx.mark_integrated();

        // Turn toward the newest wall and keep the view angle relative to it.
        if let (Some(current), Some(target)) = (ctx.wall_normal(), ctx.target_wall_normal()) {
            let max_angle = ctx.config.wallrun_rotate_max_rate * ctx.dt();
            let rotated = rotate_towards(current, target, max_angle);
            ctx.state.wallrun.set_wall_normal(Some(rotated));

            let yaw_delta = wrap_angle(yaw_of(rotated) - yaw_of(current));
            ctx.state.eye_angles.y = wrap_angle(ctx.state.eye_angles.y + yaw_delta);
        }
    }

    fn tags(&self, _ctx: &MechanicContext<'_>) -> MechanicTags {
        MechanicTags::WALLRUN
    }
}

/// An air move touched a wall. Starts tracking it if it can be run on.
pub(crate) fn on_wall_touch(ctx: &mut MechanicContext<'_>, wall_normal: Vec3) {
    if ctx.state.is_active(MechanicId::Wallrun) {
        return;
    }

    let eligibility = eligibility(ctx, ctx.state.position, wall_normal);
    if eligibility == Eligibility::Ineligible {
        return;
    }

    ctx.state.wallrun.weak = eligibility == Eligibility::Weak;
    update_wall_normal(ctx, wall_normal);
}

/// Normal of a runnable wall we would touch within `time` at the current velocity.
pub(crate) fn predict(ctx: &MechanicContext<'_>, time: f32) -> Option<Vec3> {
    let tr = ctx.trace_with_velocity(time);
    let normal = tr.hit_normal?;

    if ctx.is_floor(normal) {
        return None;
    }

    if eligibility(ctx, tr.end_position, normal) == Eligibility::Ineligible
        || !can_feet_reach_wall(ctx, tr.end_position, normal)
    {
        return None;
    }

    Some(normal)
}

// ============================================================================
// Movement
// ============================================================================

fn wallrun_move(ctx: &mut MechanicContext<'_>, wall_normal: Vec3, timers: &MechanicTimers) {
    let config = ctx.config;
    let dt = ctx.dt();
    let since_start = timers.since_start(&ctx.state.clock);
    let slip_scale = slip_scale(ctx, since_start);

    let wish_dir = build_wish_dir(ctx, wall_normal);

    let gravity_scale = if ctx.state.wallrun.weak {
        1.0
    } else {
        (since_start / config.wallrun_gravity_ramp_up_time).clamp(0.0, 1.0)
    };
    let half_gravity = Vec3::NEG_Y * 0.5 * ctx.player_gravity() * gravity_scale * dt;

    let mut velocity = reject(ctx.state.velocity + half_gravity, wall_normal);

    let horizontal_friction = config.wallrun_friction;
    let mut vertical_friction = config.wallrun_friction;
    if velocity.y < 0.0 {
        vertical_friction *= slip_scale;

        if wish_dir.length_squared() < 1.0e-6 {
            vertical_friction *= 1.0 - config.wallrun_no_input_slip_frac;
        }
    }

    let horizontal = apply_friction(flatten(velocity), horizontal_friction, dt);
    let vertical = apply_friction(Vec3::Y * velocity.y, vertical_friction, dt);
    velocity = horizontal + vertical;

    velocity = accelerate_split(
        ctx,
        velocity,
        wish_dir,
        config.wallrun_acceleration_horizontal,
        config.wallrun_acceleration_vertical * slip_scale,
    );

    velocity = reject(velocity, wall_normal);
    if velocity.length_squared() < 1.0 {
        velocity = Vec3::ZERO;
    }
    ctx.state.velocity = velocity;

    let position = ctx.state.position;
    let tr = ctx.sweep(position, position + velocity * dt);
    ctx.state.velocity += half_gravity;

    if let Some(normal) = tr.hit_normal {
        if ctx.is_floor(normal) {
            ctx.state.wallrun.clear();
            ctx.state.position = tr.end_position;
            return;
        }
    }

    if tr.fraction >= 1.0 {
        ctx.state.position = tr.end_position;
        return;
    }

    // Blocked along the wall: step over the obstacle with the wall as "up".
    let mut mover = ctx.mover();
    let (_, step) = mover.try_move_with_step(dt, config.step_height_max, wall_normal);
    ctx.apply_move(&mover);

    if let Some(hit) = mover.hit_normal {
        if ctx.is_floor(hit) {
            ctx.state.wallrun.clear();
        } else if eligibility(ctx, ctx.state.position, hit) != Eligibility::Ineligible {
            update_wall_normal(ctx, hit);
        }
    }

    ctx.add_step_offset(-wall_normal * step);
}

/// Re-check the wall after moving, falling away when the run should end and
/// snapping onto the wall otherwise.
fn categorize(ctx: &mut MechanicContext<'_>, timers: &MechanicTimers) {
    let Some(wall_normal) = ctx.wall_normal() else {
        return;
    };
    let target = ctx.target_wall_normal().unwrap_or(wall_normal);
    let config = ctx.config;

    let max_step = config.step_height_max.max(config.wallrun_allowed_wall_dist);
    let origin = ctx.state.position;

    if !can_feet_reach_wall(ctx, origin, wall_normal) {
        fall_away(ctx, wall_normal, true);
        return;
    }

    if ctx.state.velocity.y > 0.0 && is_near_top_wall(ctx, origin, wall_normal) {
        apply_top_wall_decel(ctx);
    }

    if ctx.cmd.is_held(CommandButtons::DUCK) {
        fall_away(ctx, wall_normal, false);
        return;
    }

    if timers.since_start(&ctx.state.clock) > config.wallrun_time_limit {
        fall_away(ctx, wall_normal, true);
        return;
    }

    // A sharp turn in the wall: follow it without snapping.
    let move_to_end = wall_normal.dot(target) >= config.wallrun_angle_change_min_cos;

    let tr = ctx.sweep(origin, origin - target * max_step);
    match tr.hit_normal {
        Some(normal) if !ctx.is_floor(normal) => update_wall_normal(ctx, normal),
        _ => {
            ctx.state.wallrun.clear();
            return;
        }
    }

    let Some(wall_normal) = ctx.wall_normal() else {
        return;
    };
    if ctx.wish_dir().dot(wall_normal) < PUSH_AWAY_DOT {
        ctx.state.wallrun.not_pushing_away = ctx.now();
    } else if ctx.since(ctx.state.wallrun.not_pushing_away) > config.wallrun_push_away_fall_off_time {
        fall_away(ctx, wall_normal, true);
        return;
    }

    if !move_to_end || tr.started_in_solid {
        return;
    }

    ctx.state.position = tr.end_position;
    let moved = (ctx.state.position - origin).dot(target);
    ctx.add_step_offset(-target * moved);
}

/// Leave the wall with a small outward kick. `start_grace` opens the wall-jump grace period.
fn fall_away(ctx: &mut MechanicContext<'_>, wall_normal: Vec3, start_grace: bool) {
    ctx.state.velocity += wall_normal * ctx.config.wallrun_fall_away_speed;
    ctx.state.wallrun.clear();

    if start_grace {
        ctx.state.wallrun.fell_away = ctx.now();
    }
    log::trace!("fell away from wall, grace {start_grace}");
}

/// Track a newly detected wall. The current normal turns toward it over the next ticks.
fn update_wall_normal(ctx: &mut MechanicContext<'_>, wall_normal: Vec3) {
    if ctx.wall_normal().is_none() {
        ctx.state.wallrun.set_wall_normal(Some(wall_normal));
    }

    let changed = match ctx.target_wall_normal() {
        Some(target) => !target.abs_diff_eq(wall_normal, 1.0e-4),
        None => true,
    };
    if changed {
        ctx.state.wallrun.target_wall_normal = Some(wall_normal);
    }
}

/// Slow upward motion near the top edge of a wall so we do not fly off it.
fn apply_top_wall_decel(ctx: &mut MechanicContext<'_>) {
    let velocity = ctx.state.velocity;
    let direction = flatten(velocity).normalize_or_zero();
    let projected = direction * velocity.dot(direction);

    let decel = (projected - velocity).clamp_length_max(ctx.config.wallrun_avoid_top_wall_decel * ctx.dt());
    ctx.state.velocity += decel;
}

/// 1 until the slip start time, then falling to 0 over the slip duration.
fn slip_scale(ctx: &MechanicContext<'_>, since_start: f32) -> f32 {
    let config = ctx.config;
    let fraction = (since_start - config.wallrun_slip_start_time) / config.wallrun_slip_duration;
    1.0 - fraction.clamp(0.0, 1.0)
}

fn apply_friction(velocity: Vec3, friction: f32, dt: f32) -> Vec3 {
    let speed = velocity.length();
    if speed < 0.1 {
        return velocity;
    }

    let new_speed = (speed - speed * friction * dt).max(0.0);
    velocity * (new_speed / speed)
}

/// Accelerate the horizontal and vertical parts separately, each with its own cap.
fn accelerate_split(
    ctx: &MechanicContext<'_>,
    velocity: Vec3,
    wish_dir: Vec3,
    horizontal_acceleration: f32,
    vertical_acceleration: f32,
) -> Vec3 {
    let config = ctx.config;
    let horizontal_wish = flatten(wish_dir);
    let vertical_wish = Vec3::Y * wish_dir.y;

    let backwards = ctx.state.forward_direction().dot(wish_dir) < BACKWARDS_DOT;
    let (horizontal_max, vertical_max) = if backwards {
        (
            horizontal_wish.length() * config.wallrun_max_speed_backwards,
            vertical_wish.length() * config.wallrun_max_speed_backwards,
        )
    } else {
        (
            (horizontal_wish.length() * config.wallrun_max_speed_horizontal)
                .min(config.wallrun_max_speed_horizontal),
            (vertical_wish.length() * config.wallrun_max_speed_vertical).min(config.wallrun_max_speed_vertical),
        )
    };

    let dt = ctx.dt();
    let horizontal = super::accelerate(
        flatten(velocity),
        horizontal_wish.normalize_or_zero(),
        horizontal_max,
        horizontal_acceleration,
        dt,
    );
    let vertical = super::accelerate(
        Vec3::Y * velocity.y,
        vertical_wish.normalize_or_zero(),
        vertical_max,
        vertical_acceleration,
        dt,
    );

    horizontal + vertical
}

/// Input direction on the wall plane.
///
/// Looking nearly straight into or away from the wall, forward input climbs.
/// Otherwise forward follows the view, sideways input only moves toward the
/// wall, and moving forward adds a little upward push.
fn build_wish_dir(ctx: &MechanicContext<'_>, wall_normal: Vec3) -> Vec3 {
    let state = &ctx.state;
    let forward_move = ctx.cmd.forward_move;
    let right_move = ctx.cmd.right_move;
    let flat_forward = state.forward_direction();
    let look = state.look_direction();

    let looking_at_normal = flat_forward.dot(wall_normal);
    if looking_at_normal.abs() > CLIMB_LOOK_DOT {
        let climb = Vec3::NEG_Y * looking_at_normal.signum();
        let side = climb.cross(wall_normal);
        return (climb * forward_move + side * right_move).normalize_or_zero();
    }

    // Only allow sideways input toward the wall.
    let looking_right = flat_forward.dot(wall_normal.cross(Vec3::Y));
    let left_move = -right_move;
    let left_move = if looking_right < 0.0 {
        left_move.clamp(0.0, 1.0)
    } else if looking_right > 0.0 {
        left_move.clamp(-1.0, 0.0)
    } else {
        0.0
    };
    let lateral = wall_normal.cross(look) * left_move;

    let forward_back = reject(look * forward_move, wall_normal).normalize_or_zero();

    let mut upward_push = Vec3::ZERO;
    if forward_move > 0.0 {
        let amount = (ctx.config.wallrun_upward_auto_push - look.dot(Vec3::Y).clamp(0.0, 1.0)).max(0.0);
        upward_push = reject(camera_up(state.eye_angles), wall_normal).normalize_or_zero() * amount;
    }

    let wish_dir = lateral + forward_back;
    wish_dir + upward_push * flatten(wish_dir).length()
}

/// The view's up vector for the given eye angles.
fn camera_up(eye_angles: Vec3) -> Vec3 {
    let (sin_pitch, cos_pitch) = eye_angles.x.sin_cos();
    let (sin_yaw, cos_yaw) = eye_angles.y.sin_cos();
    Vec3::new(sin_pitch * cos_yaw, cos_pitch, sin_pitch * sin_yaw)
}

// ============================================================================
// Geometry
// ============================================================================

/// Whether the lower half of the hull touches the wall from `position`.
fn can_feet_reach_wall(ctx: &MechanicContext<'_>, position: Vec3, wall_normal: Vec3) -> bool {
    let hull = ctx.hull();
    let feet = hull.shortened(hull.height() * 0.5);
    let end = position - wall_normal * ctx.config.wallrun_allowed_wall_dist;
    ctx.sweep_shape(position, end, feet).hit_something()
}

/// Whether there is a floor just above and over the wall's edge.
fn is_near_top_wall(ctx: &MechanicContext<'_>, position: Vec3, wall_normal: Vec3) -> bool {
    let tr = ctx.sweep(position, position - wall_normal * ctx.config.wallrun_allowed_wall_dist);
    if !tr.hit_something() {
        return false;
    }

    let start = tr.end_position;
    let tr = ctx.sweep(start, start + Vec3::Y * TOP_PROBE_HEIGHT);
    if tr.hit_something() {
        return false;
    }

    let start = tr.end_position;
    let tr = ctx.sweep(start, start - wall_normal * 2.0);

    let start = tr.end_position;
    let tr = ctx.sweep(start, start - Vec3::Y * TOP_PROBE_HEIGHT);

    matches!(tr.hit_normal, Some(normal) if ctx.is_floor(normal))
}

/// A "wall" with floor below whose top is within reach is the side of a step.
fn is_step(ctx: &MechanicContext<'_>, position: Vec3, wall_normal: Vec3) -> bool {
    let tr = ctx.sweep(position, position - Vec3::Y * TOP_PROBE_HEIGHT);
    match tr.hit_normal {
        Some(normal) if ctx.is_floor(normal) => is_near_top_wall(ctx, tr.end_position, wall_normal),
        _ => false,
    }
}

fn eligibility(ctx: &MechanicContext<'_>, position: Vec3, wall_normal: Vec3) -> Eligibility {
    if !can_feet_reach_wall(ctx, position, wall_normal) {
        return Eligibility::Ineligible;
    }

    if is_step(ctx, position, wall_normal) {
        return Eligibility::Ineligible;
    }

    let wallrun = &ctx.state.wallrun;
    let fresh = match wallrun.last_start_pos {
        None => true,
        Some(_) => wall_normal.dot(wallrun.last_wall_normal) <= ctx.config.wallrun_same_wall_dot,
    };
    if fresh {
        return if wallrun.has_boost {
            Eligibility::Eligible
        } else {
            Eligibility::Weak
        };
    }

    // The same wall again: only lower than where the last run began.
    match wallrun.last_start_pos {
        Some(start) if position.y - start.y > ctx.config.wallrun_same_wall_height => Eligibility::Ineligible,
        _ => Eligibility::Weak,
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::collision::ContentFlags;
    use crate::movement::mechanics::fixture::Fixture;

    /// Airborne next to the wall at x = 0, facing along it (+Z).
    fn on_wall() -> Fixture {
        let mut fixture = Fixture::on_floor().with_wall();
        fixture.state.ground_entity = None;
        fixture.state.position = Vec3::new(-16.5, 100.0, 0.0);
        fixture.state.eye_angles.y = FRAC_PI_2;
        fixture.advance(100);
        fixture
    }

    fn active_timers(fixture: &Fixture) -> MechanicTimers {
        let now = fixture.state.clock.now();
        MechanicTimers {
            is_active: true,
            active_changed: now,
            start: now,
            last_start: now,
            ..Default::default()
        }
    }

    #[test]
    fn test_wall_touch_starts_tracking() {
        let mut fixture = on_wall();
        let mut ctx = fixture.ctx();
        on_wall_touch(&mut ctx, Vec3::NEG_X);

        assert_eq!(ctx.wall_normal(), Some(Vec3::NEG_X));
        assert_eq!(ctx.target_wall_normal(), Some(Vec3::NEG_X));
        assert!(ctx.state.wallrun.weak, "touching without a jump is weak");
        assert!(Wallrun.should_become_active(&ctx, &MechanicTimers::default()));
    }

    #[test]
    fn test_wall_touch_after_jump_is_strong() {
        let mut fixture = on_wall();
        fixture.state.wallrun.has_boost = true;
        let mut ctx = fixture.ctx();
        on_wall_touch(&mut ctx, Vec3::NEG_X);

        assert_eq!(ctx.wall_normal(), Some(Vec3::NEG_X));
        assert!(!ctx.state.wallrun.weak);
    }

    #[test]
    fn test_feet_must_reach_wall() {
        let mut fixture = Fixture::on_floor();
        // Wall face at x = 0, but starting 40 units above the feet.
        fixture.world.add_box(
            Vec3::new(20.0, 320.0, 0.0),
            Vec3::new(20.0, 180.0, 1000.0),
            ContentFlags::SOLID,
        );
        fixture.state.ground_entity = None;
        fixture.state.position = Vec3::new(-16.5, 100.0, 0.0);

        let mut ctx = fixture.ctx();
        on_wall_touch(&mut ctx, Vec3::NEG_X);
        assert_eq!(ctx.wall_normal(), None, "only the upper body touches the wall");
    }

    #[test]
    fn test_step_side_is_not_a_wall() {
        let mut fixture = Fixture::on_floor();
        fixture.world.add_box(
            Vec3::new(40.0, 6.0, 0.0),
            Vec3::new(40.0, 6.0, 1000.0),
            ContentFlags::SOLID,
        );
        fixture.state.ground_entity = None;
        fixture.state.position = Vec3::new(-16.5, 1.0, 0.0);

        let mut ctx = fixture.ctx();
        on_wall_touch(&mut ctx, Vec3::NEG_X);
        assert_eq!(ctx.wall_normal(), None, "a 12 unit ledge is a step");
    }

    #[test]
    fn test_same_wall_higher_is_ineligible() {
        let mut fixture = on_wall();
        fixture.state.wallrun.last_start_pos = Some(Vec3::new(-16.5, 50.0, 0.0));
        fixture.state.wallrun.last_wall_normal = Vec3::NEG_X;

        let mut ctx = fixture.ctx();
        on_wall_touch(&mut ctx, Vec3::NEG_X);
        assert_eq!(ctx.wall_normal(), None, "same wall, higher than the last start");

        ctx.state.wallrun.last_start_pos = Some(Vec3::new(-16.5, 150.0, 0.0));
        on_wall_touch(&mut ctx, Vec3::NEG_X);
        assert_eq!(ctx.wall_normal(), Some(Vec3::NEG_X));
        assert!(ctx.state.wallrun.weak, "lower on the same wall is weak");
    }

    #[test]
    fn test_activation_boost_and_refill() {
        let mut fixture = on_wall();
        fixture.state.wallrun.has_boost = true;
        fixture.state.jump.air_jumps_remaining = 0;
        fixture.state.velocity.y = -50.0;

        let timers = active_timers(&fixture);
        let mut ctx = fixture.ctx();
        on_wall_touch(&mut ctx, Vec3::NEG_X);
        Wallrun.on_active_changed(false, true, &mut ctx, &timers);

        let config = ctx.config;
        assert_eq!(ctx.state.velocity.y, config.wallrun_up_wall_boost - 50.0);
        assert_eq!(ctx.state.jump.air_jumps_remaining, config.air_jump_max_jumps);
        assert!(!ctx.state.wallrun.has_boost, "boost used up");
        assert_eq!(ctx.state.wallrun.last_start_pos, Some(Vec3::new(-16.5, 100.0, 0.0)));
    }

    #[test]
    fn test_runs_along_wall() {
        let mut fixture = on_wall();
        fixture.state.velocity = Vec3::new(0.0, 0.0, 300.0);
        fixture.state.wallrun.has_boost = true;
        fixture.cmd.forward_move = 1.0;
        {
            let mut ctx = fixture.ctx();
            on_wall_touch(&mut ctx, Vec3::NEG_X);
        }
        let timers = active_timers(&fixture);

        for _ in 0..10 {
            fixture.advance(1);
            let mut ctx = fixture.ctx();
            ctx.state.active.set(MechanicId::Wallrun, true);
            Wallrun.on_active_update(&mut ctx, &timers);
            assert!(ctx.is_integrated());
        }

        let wall_normal = fixture.state.wall_normal(&fixture.config);
        assert!(
            wall_normal.is_some_and(|n| n.abs_diff_eq(Vec3::NEG_X, 1.0e-3)),
            "still on the wall, got {wall_normal:?}"
        );
        assert!(fixture.state.position.z > 30.0, "ran along the wall, z = {}", fixture.state.position.z);
        assert!((fixture.state.position.x + 16.0).abs() < 1.0, "kept against the wall");
        assert!(fixture.state.velocity.x.abs() < 0.01, "no velocity into the wall");
    }

    #[test]
    fn test_time_limit_falls_away() {
        let mut fixture = on_wall();
        fixture.state.wallrun.has_boost = true;
        {
            let mut ctx = fixture.ctx();
            on_wall_touch(&mut ctx, Vec3::NEG_X);
        }
        let timers = active_timers(&fixture);
        fixture.advance(200);

        let mut ctx = fixture.ctx();
        Wallrun.on_active_update(&mut ctx, &timers);

        assert_eq!(ctx.wall_normal(), None);
        assert!(ctx.state.velocity.x < -60.0, "kicked away from the wall");
        assert!(ctx.is_now(ctx.state.wallrun.fell_away), "wall-jump grace opened");
    }

    #[test]
    fn test_duck_drops_without_grace() {
        let mut fixture = on_wall();
        fixture.cmd.held.press(CommandButtons::DUCK);
        {
            let mut ctx = fixture.ctx();
            on_wall_touch(&mut ctx, Vec3::NEG_X);
        }
        let timers = active_timers(&fixture);

        let mut ctx = fixture.ctx();
        Wallrun.on_active_update(&mut ctx, &timers);

        assert_eq!(ctx.wall_normal(), None);
        assert!(ctx.state.wallrun.fell_away.is_never());
    }

    #[test]
    fn test_predict_wall_ahead() {
        let mut fixture = Fixture::on_floor().with_wall();
        fixture.state.ground_entity = None;
        fixture.state.position = Vec3::new(-80.0, 100.0, 0.0);
        fixture.state.velocity = Vec3::new(400.0, 0.0, 0.0);

        let ctx = fixture.ctx();
        let predicted = predict(&ctx, 0.25);
        assert!(
            predicted.is_some_and(|n| n.abs_diff_eq(Vec3::NEG_X, 1.0e-3)),
            "wall 64 units ahead, got {predicted:?}"
        );
        assert_eq!(predict(&ctx, 0.05), None, "out of reach within the window");
    }

    #[test]
    fn test_wish_dir_along_wall() {
        let mut fixture = on_wall();
        fixture.cmd.forward_move = 1.0;
        let ctx = fixture.ctx();

        let wish = build_wish_dir(&ctx, Vec3::NEG_X);
        assert!(wish.x.abs() < 0.001, "stays on the wall plane");
        assert!(wish.z > 0.9, "forward along the wall");
        assert!(wish.y > 0.0, "auto push upward while running forward");
    }

    #[test]
    fn test_wish_dir_climbs_when_facing_wall() {
        let mut fixture = on_wall();
        fixture.state.eye_angles.y = 0.0;
        fixture.cmd.forward_move = 1.0;
        let ctx = fixture.ctx();

        let wish = build_wish_dir(&ctx, Vec3::NEG_X);
        assert!((wish - Vec3::Y).length() < 0.001, "forward input climbs, got {wish}");
    }

    #[test]
    fn test_wish_dir_sideways_input() {
        // Facing +Z, the wall is on the left. Pressing toward it climbs.
        let mut fixture = on_wall();
        fixture.cmd.right_move = -1.0;
        let wish = build_wish_dir(&fixture.ctx(), Vec3::NEG_X);
        assert!(wish.y > 0.5, "strafing into the wall moves up it, got {wish}");

        fixture.cmd.right_move = 1.0;
        let wish = build_wish_dir(&fixture.ctx(), Vec3::NEG_X);
        assert_eq!(wish, Vec3::ZERO, "strafing away from the wall is ignored");
    }
}
