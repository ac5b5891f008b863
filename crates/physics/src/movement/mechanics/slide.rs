//! Crouch slides.
//!
//! A slide starts when crouching at speed while moving roughly along the
//! velocity. It boosts speed once per cooldown, removes ground acceleration
//! (walking still moves us, with zero acceleration), lets the player brake a
//! little and speeds up downhill.

use crate::movement::command::CommandButtons;
use crate::movement::config::MovementConfig;
use crate::movement::context::MechanicContext;
use crate::movement::math::approach_length;
use crate::movement::mechanic::{Mechanic, MechanicId, MechanicTimers};
use crate::movement::state::MechanicTags;

/// Braking uses this fraction of the ground acceleration.
const BRAKE_SCALE: f32 = 0.2;

/// Braking steers this much sideways.
const BRAKE_STEER: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct Slide;

impl Mechanic for Slide {
    fn id(&self) -> MechanicId {
        MechanicId::Slide
    }

    fn priority(&self) -> i32 {
        15
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, timers: &MechanicTimers) -> bool {
        let state = &ctx.state;
        let config = ctx.config;

        if !state.has_tag(MechanicTags::CROUCH) {
            return false;
        }
        if state.tags.intersects(MechanicTags::WALLRUN | MechanicTags::JUMP | MechanicTags::AIRJUMP) {
            return false;
        }

        let active = timers.is_active;
        let grounded = state.is_grounded();
        let speed_squared = state.horizontal_velocity().length_squared();

        // Slides only start on the ground.
        if !active && !grounded {
            return false;
        }

        let required = config.slide_required_start_speed;
        if !active && speed_squared < required * required {
            return false;
        }

        let end = config.slide_end_speed;
        if active && grounded && speed_squared < end * end {
            return false;
        }

        if active && !grounded && ctx.since(state.last_on_ground) > config.slide_max_air_time {
            return false;
        }

        // Landing straight into a slide skips the direction check.
        let started_from_air = ctx.since(state.last_landing) <= ctx.dt();
        if !active && !started_from_air {
            let along = ctx.wish_dir().dot(state.velocity.normalize_or_zero());
            if along < config.slide_max_angle_dot {
                return false;
            }
        }

        true
    }

    fn on_active_changed(
        &mut self,
        _before: bool,
        after: bool,
        ctx: &mut MechanicContext<'_>,
        _timers: &MechanicTimers,
    ) {
        if after {
            start_slide(ctx);
            ctx.state.slide.last_start = ctx.now();
        } else {
            ctx.state.slide.fov_target = 0.0;
        }
    }

    fn on_active_update(&mut self, ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {
        if !ctx.state.is_grounded() {
            return;
        }

        let config = ctx.config;
        let dt = ctx.dt();

        let mut deceleration = config.slide_decel;
        let force_speed = config.slide_force_slide_speed;
        if !ctx.cmd.is_held(CommandButtons::DUCK)
            && ctx.state.horizontal_velocity().length_squared() > force_speed * force_speed
        {
            deceleration += config.slide_force_slide_unduck_decel;
        }

        let decay = config.slide_velocity_decay.min(1.0);
        let velocity = ctx.state.velocity * decay.powf(dt);
        ctx.state.velocity = approach_length(velocity, 0.0, deceleration * dt);

        brake(ctx, config.acceleration * BRAKE_SCALE);
        apply_incline_gravity(ctx);
    }

    fn tags(&self, _ctx: &MechanicContext<'_>) -> MechanicTags {
        MechanicTags::SLIDE
    }

    fn acceleration(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        Some(0.0)
    }
}

/// Begin a slide, or restart one when landing mid-slide. Boosts speed once per cooldown.
pub(crate) fn start_slide(ctx: &mut MechanicContext<'_>) {
    let config = ctx.config;
    let since_last_slide = ctx.since(ctx.state.slide.last_start);
    let since_landing = ctx.since(ctx.state.last_landing);
    let direction = ctx.state.horizontal_velocity().normalize_or_zero();

    let slide = &mut ctx.state.slide;
    slide.used_boost = false;
    slide.start_speed = ctx.state.velocity.length();

    if since_last_slide >= config.slide_boost_cooldown {
        let boost = speed_boost(config, slide.start_speed);
        ctx.state.velocity += direction * boost;

        let slide = &mut ctx.state.slide;
        slide.used_boost = true;
        slide.fov_target = 1.0;
        log::trace!("slide boost {boost:.1}");
    }

    ctx.state.slide.tilt_axis = direction;

    // Skips do not widen the view.
    if since_landing > config.skip_time {
        ctx.state.slide.fov_target = 1.0;
    }
}

/// Speed a boost adds from `start_speed`, never passing the boost cap.
pub(crate) fn speed_boost(config: &MovementConfig, start_speed: f32) -> f32 {
    (config.slide_speed_boost_cap - start_speed).clamp(0.0, config.slide_speed_boost)
}

/// Braking toward the input, with almost no sideways steering.
fn brake(ctx: &mut MechanicContext<'_>, deceleration: f32) {
    let wish_speed = ctx.wish_speed();
    let mut wish_dir = ctx.wish_dir();
    let velocity = ctx.state.velocity;

    let add_speed = wish_speed - velocity.dot(wish_dir);

    let direction = velocity.normalize_or_zero();
    let projected = direction * direction.dot(wish_dir);
    wish_dir = projected + (wish_dir - projected) * BRAKE_STEER;

    if add_speed <= 0.0 {
        return;
    }

    let magnitude_squared = (wish_speed * wish_speed).max(velocity.length_squared());
    let accel_speed = (deceleration * ctx.dt()).min(add_speed);

    ctx.state.velocity = (velocity + wish_dir * accel_speed).clamp_length_max(magnitude_squared.sqrt());
}

/// Ground moves ignore gravity, so push downhill by hand.
fn apply_incline_gravity(ctx: &mut MechanicContext<'_>) {
    let normal = ctx.state.ground_normal;
    let mut incline = normal * normal.y;
    incline.y = 0.0;

    ctx.state.velocity += incline * ctx.player_gravity() * ctx.dt();
}
