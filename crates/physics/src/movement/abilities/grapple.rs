//! Grapple hook.
//!
//! The ability button fires a hook along the view. A hook that hits
//! geometry attaches and pulls the character toward it until the button is
//! pressed again or the eyes reach the anchor. A hook that flies its full
//! length comes back. The rope bends around corners between the eyes and
//! the hook, and lets go when it bends too often.

use glam::Vec3;

use crate::collision::{TraceResult, TraceShape};
use crate::movement::ability::{Ability, AbilityId};
use crate::movement::command::CommandButtons;
use crate::movement::context::MechanicContext;
use crate::movement::events::MovementEvent;
use crate::movement::math::approach_point;
use crate::movement::mechanic::MechanicTimers;
use crate::movement::state::GrapplePhase;

/// Rope traces stop this short of their end, so corners never sit inside geometry.
const ROPE_BACKOFF: f32 = 0.1;

/// Closer than this to the pull point, the pull has no direction.
const MIN_PULL_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Grapple;

impl Ability for Grapple {
    fn id(&self) -> AbilityId {
        AbilityId::Grapple
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, timers: &MechanicTimers) -> bool {
        if !timers.is_active && ctx.cmd.was_pressed(CommandButtons::ABILITY) {
            return true;
        }
        ctx.state.grapple.phase != GrapplePhase::Idle
    }

    fn on_active_changed(
        &mut self,
        _before: bool,
        after: bool,
        ctx: &mut MechanicContext<'_>,
        _timers: &MechanicTimers,
    ) {
        let eye = ctx.state.eye_position();
        let aim = ctx.state.look_direction();
        let length = ctx.config.grapple_length;

        let grapple = &mut ctx.state.grapple;
        grapple.points.clear();

        if !after {
            grapple.phase = GrapplePhase::Idle;
            return;
        }

        grapple.phase = GrapplePhase::Shooting;
        grapple.target = eye + aim * length;
        grapple.points.push(eye);
    }

    fn on_active_update(&mut self, ctx: &mut MechanicContext<'_>, timers: &MechanicTimers) {
        wrap_rope(ctx);
        unwrap_rope(ctx);
        move_hook(ctx);

        let debounced = timers.since_start(&ctx.state.clock) >= ctx.config.grapple_detach_debounce;
        if debounced && ctx.cmd.was_pressed(CommandButtons::ABILITY) {
            release(ctx);
        }

        if ctx.state.grapple.is_attached() {
            pull(ctx);
        }
    }

    fn speed(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        ctx.state.grapple.is_attached().then_some(ctx.config.grapple_air_speed)
    }

    fn acceleration(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        ctx.state.grapple.is_attached().then_some(ctx.config.grapple_air_acceleration)
    }

    fn gravity_scale(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        ctx.state.grapple.is_attached().then_some(ctx.config.grapple_gravity_scale)
    }
}

fn rope_trace(ctx: &MechanicContext<'_>, start: Vec3, end: Vec3) -> TraceResult {
    let end = end - (end - start).normalize_or_zero() * ROPE_BACKOFF;
    ctx.sweep_shape(start, end, TraceShape::Point)
}

/// Add a corner where something blocks the view of the rope.
fn wrap_rope(ctx: &mut MechanicContext<'_>) {
    let eye = ctx.state.eye_position();
    let Some(last) = ctx.state.grapple.pull_point() else {
        return;
    };

    let tr = rope_trace(ctx, eye, last);
    if !tr.hit_something() || tr.started_in_solid {
        return;
    }

    let max_points = ctx.config.grapple_max_points as usize;
    let grapple = &mut ctx.state.grapple;
    grapple.points.push(tr.end_position);

    if grapple.points.len() <= max_points {
        return;
    }

    if grapple.phase == GrapplePhase::Retracting {
        grapple.points.remove(0);
    } else {
        log::debug!("grapple rope bent around too many corners");
        release(ctx);
    }
}

/// Drop the nearest corner once the eyes can see past it.
fn unwrap_rope(ctx: &mut MechanicContext<'_>) {
    let points = &ctx.state.grapple.points;
    if points.len() < 2 {
        return;
    }

    let previous = points[points.len() - 2];
    let eye = ctx.state.eye_position();
    if rope_trace(ctx, eye, previous).hit_something() {
        return;
    }

    ctx.state.grapple.points.pop();
}

/// Fly the hook toward its target, attaching to whatever it hits on the way out.
fn move_hook(ctx: &mut MechanicContext<'_>) {
    let dt = ctx.dt();
    let eye = ctx.state.eye_position();
    let config = ctx.config;
    let grapple = &ctx.state.grapple;

    let Some(hook) = grapple.hook() else {
        return;
    };

    let (mut from, target, speed) = match grapple.phase {
        GrapplePhase::Shooting => (hook, grapple.target, config.grapple_shoot_speed),
        GrapplePhase::Retracting => (
            hook,
            grapple.points.get(1).copied().unwrap_or(eye),
            config.grapple_retract_speed,
        ),
        GrapplePhase::Idle | GrapplePhase::Attached => return,
    };

    if grapple.phase == GrapplePhase::Retracting && grapple.points.len() == 1 {
        from.y -= config.grapple_retract_fall_speed * dt;
    }

    let next = approach_point(from, target, speed * dt);

    if grapple.phase == GrapplePhase::Shooting {
        let tr = ctx.sweep_shape(hook, next, TraceShape::Point);
        if tr.hit_something() {
            let anchor = tr.end_position;
            let grapple = &mut ctx.state.grapple;
            grapple.points[0] = anchor;
            grapple.phase = GrapplePhase::Attached;

            log::debug!("grapple attached at {anchor:?}");
            ctx.push_event(MovementEvent::GrappleAttached { anchor });
            return;
        }
    }

    let grapple = &mut ctx.state.grapple;
    grapple.points[0] = next;

    if next.distance_squared(target) > 1.0e-4 {
        return;
    }

    match grapple.phase {
        GrapplePhase::Shooting => grapple.phase = GrapplePhase::Retracting,
        GrapplePhase::Retracting if grapple.points.len() == 1 => grapple.phase = GrapplePhase::Idle,
        GrapplePhase::Retracting => {
            grapple.points.remove(0);
        }
        GrapplePhase::Idle | GrapplePhase::Attached => {}
    }
}

/// Accelerate toward the rope corner nearest the eyes.
fn pull(ctx: &mut MechanicContext<'_>) {
    let eye = ctx.state.eye_position();
    let Some(point) = ctx.state.grapple.pull_point() else {
        return;
    };

    let config = ctx.config;
    let offset = point - eye;
    let distance = offset.length();

    if ctx.state.grapple.points.len() == 1 && distance <= config.grapple_release_distance {
        release(ctx);
        return;
    }
    if distance < MIN_PULL_DISTANCE {
        return;
    }

    let direction = offset / distance;

    if ctx.state.is_grounded() && direction.y > 0.0 {
        ctx.clear_ground();
        ctx.state.velocity.y = ctx.state.velocity.y.max(config.grapple_ground_lift_speed);
    }

    let mut velocity = ctx.state.velocity + direction * config.grapple_pull_acceleration * ctx.dt();
    let along = velocity.dot(direction);
    if along > config.grapple_pull_speed {
        velocity -= direction * (along - config.grapple_pull_speed);
    }
    ctx.state.velocity = velocity;
}

/// Let go and bring the hook back.
fn release(ctx: &mut MechanicContext<'_>) {
    let grapple = &mut ctx.state.grapple;
    let was_attached = match grapple.phase {
        GrapplePhase::Idle | GrapplePhase::Retracting => return,
        GrapplePhase::Shooting => false,
        GrapplePhase::Attached => true,
    };

    grapple.phase = GrapplePhase::Retracting;

    if was_attached {
        log::debug!("grapple released");
        ctx.push_event(MovementEvent::GrappleReleased);
    }
}
