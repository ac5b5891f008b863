//! Ground, air and wall jumps.
//!
//! A jump press is buffered for a short window. Whenever a buffered press
//! meets a jump condition the mechanic activates for one tick and applies
//! the first jump that applies, checked in this order:
//!
//! 1. Ground jump: grounded, or within the grace period after walking off a ledge.
//! 2. Wall jump: on a wall, or within the grace period after falling away from one.
//! 3. Air jump: air jumps remain and we are not about to touch ground or a runnable wall.

use glam::Vec3;

use crate::movement::command::CommandButtons;
use crate::movement::config::MovementConfig;
use crate::movement::context::MechanicContext;
use crate::movement::events::{JumpType, MovementEvent};
use crate::movement::math::{approach_length, reject};
use crate::movement::mechanic::{Mechanic, MechanicId, MechanicTimers};
use crate::movement::state::MechanicTags;

use super::{slide, wallrun};

/// Facing into the wall harder than this while pushing forward counts as climbing.
const CLIMB_FACING_DOT: f32 = -0.71;

/// Wall jumps this soon after touching the wall are reported as fast.
const FAST_WALL_JUMP_WINDOW: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct Jump;

impl Mechanic for Jump {
    fn id(&self) -> MechanicId {
        MechanicId::Jump
    }

    fn priority(&self) -> i32 {
        1
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, timers: &MechanicTimers) -> bool {
        if !ctx.state.jump.buffered {
            return false;
        }

        if !ctx.config.can_jump_while_unducking
            && ctx.state.duck_fraction > 0.0
            && !ctx.state.has_tag(MechanicTags::CROUCH)
        {
            return false;
        }

        should_ground_jump(ctx, timers)
            || (should_air_jump(ctx) && !should_discard_air_jump(ctx))
            || should_wall_jump(ctx, timers)
    }

    fn on_active_changed(
        &mut self,
        _before: bool,
        after: bool,
        ctx: &mut MechanicContext<'_>,
        timers: &MechanicTimers,
    ) {
        if !after {
            return;
        }

        ctx.state.jump.buffered = false;

        let jump_type = if should_ground_jump(ctx, timers) {
            ground_jump(ctx);
            JumpType::Ground
        } else if should_wall_jump(ctx, timers) {
            wall_jump(ctx);
            JumpType::Wall
        } else if should_air_jump(ctx) {
            air_jump(ctx);
            JumpType::Air
        } else {
            log::error!(
                "jump activated on tick {} with no jump condition holding",
                ctx.state.clock.tick
            );
            return;
        };

        ctx.state.velocity.y -= 0.5 * ctx.player_gravity() * ctx.dt();
        ctx.notify_jumped(jump_type);
    }

    fn simulate(&mut self, ctx: &mut MechanicContext<'_>, timers: &MechanicTimers) {
        let window = ctx.config.jump_buffer_window_ticks(ctx.dt());
        let jump = &mut ctx.state.jump;

        if jump.buffered && ctx.state.clock.ticks_since(jump.buffered_at) > window {
            jump.buffered = false;
        }

        if ctx.cmd.was_pressed(CommandButtons::JUMP) {
            jump.buffered = true;
            jump.buffered_at = ctx.state.clock.now();
        }

        if ctx.state.is_grounded() || !ctx.cmd.pressed_movement_key() {
            return;
        }

        let since_jump = timers.since_start(&ctx.state.clock);
        keyboard_grace_redirect(ctx, since_jump);
    }

    fn tags(&self, ctx: &MechanicContext<'_>) -> MechanicTags {
        let jump = &ctx.state.jump;
        let mut tags = MechanicTags::NONE;

        if ctx.is_now(jump.last_ground_jump) {
            tags.insert(MechanicTags::JUMP);
        }
        if ctx.is_now(jump.last_air_jump) {
            tags.insert(MechanicTags::AIRJUMP);
        }
        if ctx.is_now(jump.last_wall_jump) {
            tags.insert(MechanicTags::WALLJUMP);
        }

        tags
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Grounded, or recently walked off a ledge without jumping since.
fn should_ground_jump(ctx: &MechanicContext<'_>, timers: &MechanicTimers) -> bool {
    if ctx.state.is_grounded() {
        return true;
    }

    let since_ground = ctx.since(ctx.state.last_on_ground);
    since_ground <= ctx.config.jump_grace_period
        && timers.since_last_start(&ctx.state.clock) > since_ground
}

fn should_air_jump(ctx: &MechanicContext<'_>) -> bool {
    ctx.state.jump.air_jumps_remaining > 0
}

/// On a wall, or recently fell away from one without jumping since.
fn should_wall_jump(ctx: &MechanicContext<'_>, timers: &MechanicTimers) -> bool {
    if ctx.wall_normal().is_some() {
        return true;
    }

    let since_fell_away = ctx.since(ctx.state.wallrun.fell_away);
    since_fell_away <= ctx.config.jump_grace_period
        && timers.since_last_start(&ctx.state.clock) > since_fell_away
}

/// Hold the air jump when the press would soon land or start a wallrun,
/// where a ground or wall jump will consume it instead.
fn should_discard_air_jump(ctx: &MechanicContext<'_>) -> bool {
    let window = ctx.config.jump_buffer_window(ctx.dt());
    predict_ground_touch(ctx, window) || wallrun::predict(ctx, window).is_some()
}

fn predict_ground_touch(ctx: &MechanicContext<'_>, time: f32) -> bool {
    match ctx.trace_with_velocity(time).hit_normal {
        Some(normal) => ctx.is_floor(normal),
        None => false,
    }
}

// ============================================================================
// Jumps
// ============================================================================

fn ground_jump(ctx: &mut MechanicContext<'_>) {
    ctx.clear_ground();

    let config = ctx.config;
    let start_y = ctx.state.velocity.y;
    let mut jump_height = if ctx.state.has_tag(MechanicTags::SLIDE) {
        config.slide_jump_height
    } else {
        config.jump_height
    };

    let fully_ducked = (ctx.state.duck_fraction - 1.0).abs() < 1.0e-4;
    let mut horizontal = ctx.state.horizontal_velocity();

    if !fully_ducked && ctx.state.has_tag(MechanicTags::CROUCH) {
        ctx.state.duck_fraction = 0.0;
    }

    // Snap slide-boost jumps near the force-slide threshold up to it. Jumping
    // before the duck finished takes the boost back.
    if ctx.state.is_active(MechanicId::Slide) && ctx.state.slide.used_boost {
        let speed = horizontal.length();
        let force_speed = config.slide_force_slide_speed;

        if speed >= force_speed - 50.0 && speed <= force_speed {
            horizontal = horizontal.normalize_or_zero() * force_speed;
        } else if !fully_ducked {
            let boost = slide::speed_boost(config, ctx.state.slide.start_speed);
            horizontal = approach_length(horizontal, 0.0, boost);
            ctx.state.duck_fraction = 1.0;
        }
    }

    if ctx.since(ctx.state.last_landing) <= config.skip_time {
        jump_height *= config.skip_jump_height_fraction;

        let retain = config.skip_speed_retain;
        if horizontal.length_squared() > retain * retain {
            let speed = (horizontal.length() - config.skip_speed_reduce).max(retain);
            horizontal = horizontal.normalize() * speed;
        }
    }

    let up_speed = (2.0 * jump_height * config.gravity).sqrt();
    ctx.state.velocity = horizontal + Vec3::Y * (start_y + up_speed);

    ctx.state.jump.air_jumps_remaining = config.air_jump_max_jumps;
    ctx.state.jump.last_ground_jump = ctx.now();
}

fn wall_jump(ctx: &mut MechanicContext<'_>) {
    let config = ctx.config;
    let wall_normal = ctx.state.wallrun.last_wall_normal;
    let mut wish_dir = ctx.wish_dir();

    let facing = ctx.state.forward_direction().dot(wall_normal);
    let climbing = facing < CLIMB_FACING_DOT && ctx.cmd.forward_move > 0.0;

    if wish_dir.dot(wall_normal) < 0.0 {
        wish_dir = reject(wish_dir, wall_normal);
    }

    let mut out_speed = config.wallrun_jump_outward_speed;
    if climbing {
        out_speed *= 0.2;
    }

    // Already rising fast adds nothing; falling adds extra.
    let up_speed = config.wallrun_jump_up_speed;
    let up_speed = (up_speed - ctx.state.velocity.y).clamp(0.0, up_speed * 1.47);

    let input_speed = config.wallrun_jump_input_dir_speed;
    let add = Vec3::Y * up_speed + wall_normal * out_speed + wish_dir * input_speed;
    let add = clamp_along(add, wall_normal, out_speed.max(input_speed));

    ctx.state.velocity += add;

    let since_touch = ctx.since(ctx.state.wallrun.touched_wall);
    if since_touch < FAST_WALL_JUMP_WINDOW {
        let speed_delta = ctx.state.horizontal_velocity().length() - ctx.state.wallrun.pre_touch_speed;
        ctx.push_event(MovementEvent::FastWallJump {
            speed_delta,
            time_since_wall_touch: since_touch,
        });
    }

    ctx.state.jump.last_wall_jump = ctx.now();
}

fn air_jump(ctx: &mut MechanicContext<'_>) {
    let config = ctx.config;
    let min_up_speed = (2.0 * config.air_jump_height * config.gravity).sqrt();

    // Rising fast already still gets a little boost.
    let diff = (min_up_speed - ctx.state.velocity.y).max(min_up_speed * config.air_jump_min_height_fraction);
    ctx.state.velocity.y += diff;

    let jump = &mut ctx.state.jump;
    jump.air_jumps_remaining = jump.air_jumps_remaining.saturating_sub(1);

    let wish_dir = ctx.wish_dir();
    if wish_dir != Vec3::ZERO {
        let horizontal_speed = config.air_jump_horizontal_speed;
        let horizontal = ctx.state.horizontal_velocity();
        let speed = horizontal.length().min(horizontal_speed);

        redirect(
            ctx,
            wish_dir,
            horizontal.normalize_or_zero() * speed,
            2.0 * horizontal_speed,
            1.0,
            Some(horizontal_speed),
        );
    }

    ctx.state.jump.last_air_jump = ctx.now();
}

/// Steer toward the input just after a jump. The effect fades out over the
/// keyboard grace period.
fn keyboard_grace_redirect(ctx: &mut MechanicContext<'_>, since_jump: f32) {
    let wish_dir = ctx.wish_dir();
    if wish_dir == Vec3::ZERO {
        return;
    }

    let config = ctx.config;
    let max = config.jump_keyboard_grace_max * config.sprint_speed;
    let strength = config.jump_keyboard_grace_strength * keyboard_grace_fraction(config, since_jump);

    let horizontal = ctx.state.horizontal_velocity();
    redirect(ctx, wish_dir, horizontal, max, strength, None);
}

/// 1 before the grace period minimum, 0 after the maximum, linear between.
fn keyboard_grace_fraction(config: &MovementConfig, since_jump: f32) -> f32 {
    let range = config.jump_keyboard_grace_period_max - config.jump_keyboard_grace_period_min;
    let fraction = (since_jump - config.jump_keyboard_grace_period_min) / range;
    1.0 - fraction.clamp(0.0, 1.0)
}

/// Turn `velocity` toward `direction` by `strength`, changing the real
/// velocity by at most `max`.
fn redirect(
    ctx: &mut MechanicContext<'_>,
    direction: Vec3,
    velocity: Vec3,
    max: f32,
    strength: f32,
    speed_override: Option<f32>,
) {
    let speed = speed_override.unwrap_or_else(|| velocity.length());
    let redirected = velocity.lerp(direction * speed, strength).normalize_or_zero() * speed;
    ctx.state.velocity += (redirected - velocity).clamp_length_max(max);
}

/// Limit the component of `v` along the unit `axis` to `max` in magnitude.
fn clamp_along(v: Vec3, axis: Vec3, max: f32) -> Vec3 {
    let along = v.dot(axis);
    v + axis * (along.clamp(-max, max) - along)
}
