//! Character controller.
//!
//! This is the main entry point for character movement. It takes input
//! commands and advances a [`CharacterState`] by one fixed tick through the
//! collision world, running the mechanics in between the per-tick
//! housekeeping they rely on.

use glam::Vec3;

use crate::collision::{SurfaceFlags, TraceFilter, TraceShape, WorldQuery};

use super::ability::Abilities;
use super::command::{CommandButtons, PlayerCommand};
use super::config::MovementConfig;
use super::context::MechanicContext;
use super::events::{EventSink, FootstepKind, MovementEvent};
use super::math::{approach, approach_length, smoothstep, wrap_angle};
use super::scheduler::Scheduler;
use super::slide_move::SlideMove;
use super::state::{CharacterState, MechanicTags};

/// How far below a spawn point the hull looks for a floor.
const SPAWN_PROBE_DEPTH: f32 = 2.0;

/// Character movement controller.
///
/// Owns the movement configuration and the mechanic scheduler for one
/// character. Each tick it:
/// - Applies the view input
/// - Ducks or unducks the hull and eyes
/// - Recovers from starting inside solid geometry
/// - Plays footsteps
/// - Runs the abilities, then the mechanics
///
/// # Example
///
/// ```ignore
/// let mut controller = CharacterController::new(MovementConfig::default());
/// let mut state = CharacterState::new(spawn_position, &controller.config);
/// controller.spawn_at(&mut state, spawn_position, &world);
///
/// // Each fixed tick:
/// controller.tick(&mut state, &command, &world, &mut events);
/// ```
#[derive(Debug)]
pub struct CharacterController {
    /// Movement configuration.
    pub config: MovementConfig,

    /// Which geometry blocks the character.
    pub filter: TraceFilter,

    /// Sprint without holding the sprint button.
    pub auto_sprint: bool,

    scheduler: Scheduler,
    abilities: Abilities,
}

impl CharacterController {
    /// Create a controller with every built-in mechanic.
    pub fn new(config: MovementConfig) -> Self {
        Self::with_scheduler(config, Scheduler::with_default_mechanics())
    }

    /// Create a controller running a custom set of mechanics.
    pub fn with_scheduler(config: MovementConfig, scheduler: Scheduler) -> Self {
        Self {
            config,
            filter: TraceFilter::player_move(None),
            auto_sprint: false,
            scheduler,
            abilities: Abilities::with_default_abilities(),
        }
    }

    /// Create a controller with default configuration.
    pub fn with_default_config() -> Self {
        Self::new(MovementConfig::default())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn abilities(&self) -> &Abilities {
        &self.abilities
    }

    /// Replace the carried abilities.
    pub fn set_abilities(&mut self, abilities: Abilities) {
        self.abilities = abilities;
    }

    /// Place a fresh character at a spawn point.
    ///
    /// Everything but the clock and the view is reset. The hull is traced a
    /// little down from the spawn point and, if it finds a floor, starts out
    /// standing on it without a landing.
    pub fn spawn_at(&mut self, state: &mut CharacterState, spawn_pos: Vec3, world: &dyn WorldQuery) {
        let clock = state.clock;
        let eye_angles = state.eye_angles;

        *state = CharacterState::new(spawn_pos, &self.config);
        state.clock = clock;
        state.eye_angles = eye_angles;
        self.scheduler.reset();
        self.abilities.reset();

        let shape = TraceShape::hull(self.config.hull_radius, self.config.hull_height_standing);
        let start = spawn_pos + Vec3::Y;
        let end = spawn_pos - Vec3::Y * SPAWN_PROBE_DEPTH;
        let tr = world.sweep(start, end, shape, &self.filter);

        match tr.hit_normal {
            Some(normal) if !tr.started_in_solid && normal.y > 0.0 => {
                state.position = tr.end_position;
                state.ground_entity = Some(tr.hit_entity);
                state.ground_normal = normal;
                state.ground_surface = tr.hit_surface;
                state.last_on_ground = state.clock.now();
            }
            _ => {
                // No ground found, use spawn position as-is
                log::debug!("no ground below spawn point {spawn_pos:?}");
            }
        }
    }

    /// Advance the character by one tick of `self.config`'s simulation.
    ///
    /// Events raised during the tick are delivered to `sink` in order once
    /// the tick is finished.
    pub fn tick(
        &mut self,
        state: &mut CharacterState,
        cmd: &PlayerCommand,
        world: &dyn WorldQuery,
        sink: &mut dyn EventSink,
    ) {
        let delta = state.clock.delta;
        state.clock.advance(delta);

        self.update_view_angles(state, cmd);
        self.update_duck(state, cmd);
        self.unstuck(state, world);

        let footstep = self.update_footsteps(state);

        let mut ctx = MechanicContext::new(state, cmd, world, &self.config, self.filter);
        ctx.auto_sprint = self.auto_sprint;
        self.abilities.run(&mut ctx);
        self.scheduler.run(&mut ctx);
        let events = ctx.take_events();

        state.last_velocity = state.velocity;

        if let Some(event) = footstep {
            event.dispatch(sink);
        }
        for event in &events {
            event.dispatch(sink);
        }
    }

    // ========================================================================
    // View Angles
    // ========================================================================

    fn update_view_angles(&self, state: &mut CharacterState, cmd: &PlayerCommand) {
        let (pitch_delta, yaw_delta) = cmd.view_delta;

        let min_pitch = -self.config.pitch_max_up.to_radians();
        let max_pitch = self.config.pitch_max_down.to_radians();

        state.eye_angles.x = (state.eye_angles.x + pitch_delta).clamp(min_pitch, max_pitch);
        state.eye_angles.y = wrap_angle(state.eye_angles.y + yaw_delta);
        state.eye_angles.z = 0.0;
    }

    // ========================================================================
    // Duck
    // ========================================================================

    /// Move the duck fraction toward the button, then derive the hull and eyes from it.
    ///
    /// Hull and eye height overrides from the last tick's mechanics replace
    /// the configured crouched heights.
    fn update_duck(&self, state: &mut CharacterState, cmd: &PlayerCommand) {
        let config = &self.config;
        let dt = state.clock.delta;
        let sliding = state.has_tag(MechanicTags::SLIDE);
        let ducked_hull = state.overrides.hull_height.unwrap_or(config.hull_height_crouching);
        let ducked_eyes = state.overrides.eye_height.unwrap_or(config.view_height_crouching);

        let target = if cmd.is_held(CommandButtons::DUCK) { 1.0 } else { 0.0 };

        if state.duck_fraction > target {
            state.duck_fraction = if state.crouch.force_duck {
                1.0
            } else {
                approach(state.duck_fraction, 0.0, config.unduck_speed * dt)
            };
        } else if state.duck_fraction < target {
            let speed = if sliding { config.unduck_speed } else { config.duck_speed };
            state.duck_fraction = approach(state.duck_fraction, 1.0, speed * dt);
        }

        if (state.duck_fraction - target).abs() < 1.0e-4 {
            state.hull_height = if target > 0.5 {
                ducked_hull
            } else {
                config.hull_height_standing
            };
        }

        if sliding {
            state.hull_height = ducked_hull;
        }

        state.step_smoothing_offset = approach_length(
            state.step_smoothing_offset,
            0.0,
            config.step_smoothing_offset_correct_speed * dt,
        );

        let duck_time = smoothstep(state.duck_fraction);
        state.eye_height =
            config.view_height_standing + (ducked_eyes - config.view_height_standing) * duck_time;
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    fn unstuck(&self, state: &mut CharacterState, world: &dyn WorldQuery) {
        let shape = TraceShape::hull(self.config.hull_radius, state.hull_height);
        let mut mover = SlideMove::new(world, shape, self.filter, state.position, state.velocity);

        if !mover.try_unstuck() {
            log::warn!("character stuck at {:?}", state.position);
            return;
        }

        state.position = mover.position;
        state.velocity = mover.velocity;
    }

    // ========================================================================
    // Footsteps
    // ========================================================================

    /// Count down to the next footstep and raise one when moving fast enough
    /// on the ground or along a wall.
    fn update_footsteps(&self, state: &mut CharacterState) -> Option<MovementEvent> {
        let config = &self.config;

        if state.footstep_cooldown > 0.0 {
            state.footstep_cooldown = (state.footstep_cooldown - state.clock.delta).max(0.0);
            return None;
        }

        let wallrunning = state.has_tag(MechanicTags::WALLRUN);
        if (!state.is_grounded() && !wallrunning) || state.has_tag(MechanicTags::SLIDE) {
            return None;
        }

        let crouched = state.has_tag(MechanicTags::CROUCH);
        let (walk_speed, run_speed) = if crouched {
            (config.footstep_duck_walk_speed, config.footstep_duck_run_speed)
        } else {
            (config.footstep_normal_walk_speed, config.footstep_normal_run_speed)
        };

        let speed = state.velocity.length();
        if speed < walk_speed {
            return None;
        }

        let surface = if state.is_grounded() {
            state.ground_surface
        } else {
            SurfaceFlags::NONE
        };
        if surface.contains(SurfaceFlags::NO_STEPS) {
            return None;
        }

        let walking = speed < run_speed;
        state.footstep_cooldown = if walking {
            config.footstep_walk_interval
        } else {
            config.footstep_sprint_interval
        };
        if crouched {
            state.footstep_cooldown += config.footstep_duck_interval_add;
        }

        let kind = match (wallrunning, walking) {
            (true, _) => FootstepKind::Wallrun,
            (false, true) => FootstepKind::Walk,
            (false, false) => FootstepKind::Run,
        };

        Some(MovementEvent::Footstep {
            kind,
            quiet: crouched,
            surface,
        })
    }
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::with_default_config()
    }
}
