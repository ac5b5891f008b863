//! Everything a mechanic may read or change during a tick.
//!
//! The context bundles the character state with the tick's command, the
//! world and the configuration, and hosts the movement primitives shared by
//! several mechanics: hull sweeps, ground categorization, the air and step
//! moves, and the reactions to landing and jumping.

use glam::Vec3;

use crate::collision::{TraceFilter, TraceResult, TraceShape, WorldQuery};

use super::command::PlayerCommand;
use super::config::MovementConfig;
use super::events::{JumpType, MovementEvent};
use super::mechanic::MechanicId;
use super::mechanics::{slide, wallrun};
use super::slide_move::{surface_angle, SlideMove};
use super::state::CharacterState;
use super::time::TickStamp;

/// How far below the feet a grounded character looks for ground.
const GROUND_PROBE_DISTANCE: f32 = 2.0;

/// The ground probe starts this far above the feet, with a hull shortened to match.
const GROUND_PROBE_LIFT: f32 = 4.0;

pub struct MechanicContext<'a> {
    pub state: &'a mut CharacterState,
    pub cmd: &'a PlayerCommand,
    pub world: &'a dyn WorldQuery,
    pub config: &'a MovementConfig,
    pub filter: TraceFilter,

    /// Sprint whenever the other sprint conditions hold, without a button.
    pub auto_sprint: bool,

    events: Vec<MovementEvent>,
    integrated: bool,
}

impl<'a> MechanicContext<'a> {
    pub fn new(
        state: &'a mut CharacterState,
        cmd: &'a PlayerCommand,
        world: &'a dyn WorldQuery,
        config: &'a MovementConfig,
        filter: TraceFilter,
    ) -> Self {
        Self {
            state,
            cmd,
            world,
            config,
            filter,
            auto_sprint: false,
            events: Vec::new(),
            integrated: false,
        }
    }

    // ========================================================================
    // Time
    // ========================================================================

    #[inline]
    pub fn dt(&self) -> f32 {
        self.state.clock.delta
    }

    #[inline]
    pub fn now(&self) -> TickStamp {
        self.state.clock.now()
    }

    #[inline]
    pub fn since(&self, stamp: TickStamp) -> f32 {
        self.state.clock.since(stamp)
    }

    #[inline]
    pub fn is_now(&self, stamp: TickStamp) -> bool {
        self.state.clock.is_now(stamp)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The character's current hull.
    #[inline]
    pub fn hull(&self) -> TraceShape {
        TraceShape::hull(self.config.hull_radius, self.state.hull_height)
    }

    /// Sweep the current hull.
    #[inline]
    pub fn sweep(&self, start: Vec3, end: Vec3) -> TraceResult {
        self.world.sweep(start, end, self.hull(), &self.filter)
    }

    #[inline]
    pub fn sweep_shape(&self, start: Vec3, end: Vec3, shape: TraceShape) -> TraceResult {
        self.world.sweep(start, end, shape, &self.filter)
    }

    /// Sweep the hull with its feet raised by `lift_feet`, keeping the top in place.
    pub fn sweep_lifted(&self, start: Vec3, end: Vec3, lift_feet: f32) -> TraceResult {
        let shape = self.hull().shortened(lift_feet);
        self.sweep_shape(start + Vec3::Y * lift_feet, end, shape)
    }

    /// Sweep along the current velocity for `time` seconds.
    pub fn trace_with_velocity(&self, time: f32) -> TraceResult {
        let position = self.state.position;
        self.sweep(position, position + self.state.velocity * time)
    }

    /// Whether a surface with this normal can be stood on.
    #[inline]
    pub fn is_floor(&self, normal: Vec3) -> bool {
        surface_angle(normal, Vec3::Y) <= self.config.ground_angle_radians()
    }

    /// Whether a standing hull fits at the current position.
    pub fn can_unduck(&self) -> bool {
        let standing = TraceShape::hull(self.config.hull_radius, self.config.hull_height_standing);
        let position = self.state.position;
        !self.sweep_shape(position, position, standing).hit_something()
    }

    #[inline]
    pub fn wish_dir(&self) -> Vec3 {
        self.state.wish_dir(self.cmd)
    }

    /// Target ground speed: the merged speed override, or the walk speed.
    #[inline]
    pub fn wish_speed(&self) -> f32 {
        self.state.overrides.speed.unwrap_or(self.config.walk_speed)
    }

    #[inline]
    pub fn wall_normal(&self) -> Option<Vec3> {
        self.state.wall_normal(self.config)
    }

    #[inline]
    pub fn target_wall_normal(&self) -> Option<Vec3> {
        self.state.target_wall_normal(self.config)
    }

    /// Gravity while integrating, with any ability gravity scale applied.
    #[inline]
    pub fn player_gravity(&self) -> f32 {
        match self.state.ability_overrides.gravity_scale {
            Some(scale) => self.config.gravity * scale,
            None => self.config.player_gravity(),
        }
    }

    // ========================================================================
    // Ground
    // ========================================================================

    /// Probe below the feet and update the ground.
    ///
    /// With `stay_on_ground`, the probe reaches a full step down and the
    /// character snaps onto whatever ground it finds.
    pub fn categorize_position(&mut self, stay_on_ground: bool) {
        if self.state.velocity.y > self.config.max_non_jump_velocity {
            self.clear_ground();
            return;
        }

        let position = self.state.position;
        let mut point = position - Vec3::Y * GROUND_PROBE_DISTANCE;
        let mut move_to_end = false;

        if self.state.is_grounded() || stay_on_ground {
            move_to_end = true;
            point.y -= self.config.step_height_max;
        }

        let tr = self.sweep_lifted(position, point, GROUND_PROBE_LIFT);

        match tr.hit_normal {
            Some(normal) if self.is_floor(normal) => self.update_ground(&tr),
            _ => {
                self.clear_ground();
                move_to_end = false;
            }
        }

        if move_to_end && !tr.started_in_solid && tr.fraction > 0.0 && tr.fraction < 1.0 {
            self.state.position = tr.end_position;
        }
    }

    /// Stand on whatever the trace hit.
    pub fn update_ground(&mut self, tr: &TraceResult) {
        self.state.ground_normal = tr.normal_or_zero();
        self.state.ground_surface = tr.hit_surface;
        self.set_ground(Some(tr.hit_entity));
    }

    pub fn set_ground(&mut self, entity: Option<i32>) {
        let was_grounded = self.state.is_grounded();

        self.state.last_ground_entity = self.state.ground_entity;
        self.state.ground_entity = entity;

        if entity.is_none() {
            return;
        }

        self.state.velocity.y = 0.0;
        self.state.last_on_ground = self.now();

        if !was_grounded {
            self.state.fall_speed = self.state.last_velocity.y;
            self.state.last_landing = self.now();
            self.notify_landed();
        }
    }

    pub fn clear_ground(&mut self) {
        if self.state.ground_entity.is_none() {
            return;
        }

        self.state.last_ground_entity = self.state.ground_entity;
        self.state.ground_entity = None;
        self.state.last_on_ground = self.now();
    }

    // ========================================================================
    // Motion
    // ========================================================================

    /// A slide move starting from the current position and velocity.
    pub fn mover(&self) -> SlideMove<'a> {
        SlideMove::new(
            self.world,
            self.hull(),
            self.filter,
            self.state.position,
            self.state.velocity,
        )
        .with_max_standable_angle(self.config.ground_angle_radians())
    }

    /// Copy a finished move back into the state.
    #[inline]
    pub fn apply_move(&mut self, mover: &SlideMove<'_>) {
        self.state.position = mover.position;
        self.state.velocity = mover.velocity;
    }

    /// Move with stair stepping along `up`. Returns how far the move stepped.
    pub fn step_move(&mut self, up: Vec3) -> f32 {
        let mut mover = self.mover();
        let (_, step_amount) = mover.try_move_with_step(self.dt(), self.config.step_height_max, up);
        self.apply_move(&mover);
        step_amount
    }

    /// Airborne move. Touching a wall reports it to the wall-run logic.
    pub fn move_air(&mut self) {
        let mut mover = self.mover();
        mover.try_move(self.dt(), Vec3::Y);

        let before_speed = self.state.horizontal_velocity().length();
        let before_y = self.state.velocity.y;
        self.apply_move(&mover);

        if let (true, Some(normal)) = (mover.hit_wall, mover.hit_normal) {
            self.state.fall_speed = before_y;
            self.state.wallrun.pre_touch_speed = before_speed;
            self.state.wallrun.touched_wall = self.now();
            wallrun::on_wall_touch(self, normal);
        }
    }

    /// Accumulate a visual step offset. Small steps are ignored.
    pub fn add_step_offset(&mut self, offset: Vec3) {
        let min = self.config.step_height_min;
        if offset.length_squared() < min * min {
            return;
        }
        self.state.step_smoothing_offset += offset;
    }

    /// Record that a mechanic moved the character this tick.
    #[inline]
    pub fn mark_integrated(&mut self) {
        self.integrated = true;
    }

    #[inline]
    pub fn is_integrated(&self) -> bool {
        self.integrated
    }

    // ========================================================================
    // Reactions and events
    // ========================================================================

    pub fn notify_landed(&mut self) {
        self.state.jump.air_jumps_remaining = self.config.air_jump_max_jumps;

        if self.state.is_active(MechanicId::Slide) {
            slide::start_slide(self);
        }

        self.state.wallrun.has_boost = false;
        self.state.wallrun.last_start_pos = None;

        let fall_speed = self.state.fall_speed;
        let fall_height = self.state.fall_height(self.config.gravity);
        let hard = fall_height >= self.config.hard_fall_dist;

        log::trace!("landed: fall speed {fall_speed:.1}, height {fall_height:.1}ft");
        self.push_event(MovementEvent::Landed {
            fall_speed,
            fall_height,
            hard,
        });
    }

    pub fn notify_jumped(&mut self, jump_type: JumpType) {
        self.state.wallrun.has_boost = true;

        if self.state.is_active(MechanicId::Wallrun) {
            self.state.wallrun.clear();
        }

        log::trace!("jumped: {jump_type:?}");
        self.push_event(MovementEvent::Jumped(jump_type));
    }

    #[inline]
    pub fn push_event(&mut self, event: MovementEvent) {
        self.events.push(event);
    }

    /// Take the events raised so far, leaving none behind.
    pub fn take_events(&mut self) -> Vec<MovementEvent> {
        std::mem::take(&mut self.events)
    }
}
