//! Slide move algorithm for collision response.
//!
//! Sweeps the hull along its velocity, and on each hit clips the velocity
//! against every plane touched so far before trying the rest of the move.
//! A step variant also tries the same move lifted by a step height and
//! keeps whichever got further.

use glam::Vec3;

use crate::collision::{TraceFilter, TraceResult, TraceShape, WorldQuery};
use crate::random::{self, RngVecExt};

use super::clip_planes::ClipPlanes;

/// Most bumps a single move may take.
const MAX_BUMPS: usize = 5;

/// Distance kept between the hull and a surface after a hit.
const SURFACE_OFFSET: f32 = 0.03125;

/// Below this speed the move is skipped.
const MIN_MOVE_SPEED: f32 = 1.0e-4;

/// Straight-up offsets tried before random ones when stuck.
const UNSTUCK_UP_ATTEMPTS: usize = 20;
const UNSTUCK_RANDOM_ATTEMPTS: usize = 100;

/// A hull moving through the world for one integration step.
#[derive(Clone)]
pub struct SlideMove<'a> {
    pub position: Vec3,
    pub velocity: Vec3,

    /// The first bump of the last move hit a surface too steep to stand on.
    pub hit_wall: bool,
    pub hit_normal: Option<Vec3>,

    /// Extra bounce off floors and walls. Zero slides flush along them.
    pub ground_bounce: f32,
    pub wall_bounce: f32,

    /// Steepest standable surface, radians from the up axis.
    pub max_standable_angle: f32,

    world: &'a dyn WorldQuery,
    shape: TraceShape,
    filter: TraceFilter,
}

impl<'a> SlideMove<'a> {
    pub fn new(
        world: &'a dyn WorldQuery,
        shape: TraceShape,
        filter: TraceFilter,
        position: Vec3,
        velocity: Vec3,
    ) -> Self {
        Self {
            position,
            velocity,
            hit_wall: false,
            hit_normal: None,
            ground_bounce: 0.0,
            wall_bounce: 0.0,
            max_standable_angle: 46.0_f32.to_radians(),
            world,
            shape,
            filter,
        }
    }

    /// Set the steepest standable angle, in radians.
    pub fn with_max_standable_angle(mut self, radians: f32) -> Self {
        self.max_standable_angle = radians;
        self
    }

    #[inline]
    pub fn shape(&self) -> TraceShape {
        self.shape
    }

    /// Sweep the hull between two points.
    #[inline]
    pub fn trace(&self, start: Vec3, end: Vec3) -> TraceResult {
        self.world.sweep(start, end, self.shape, &self.filter)
    }

    /// Sweep from the current position by `delta` and move to where the sweep ended.
    pub fn trace_move(&mut self, delta: Vec3) -> TraceResult {
        let tr = self.trace(self.position, self.position + delta);
        self.position = tr.end_position;
        tr
    }

    /// Whether a surface normal is within the standable angle of `up`.
    #[inline]
    pub fn is_floor(&self, normal: Vec3, up: Vec3) -> bool {
        surface_angle(normal, up) <= self.max_standable_angle
    }

    /// Move along the velocity for `dt` seconds, sliding along whatever is hit.
    ///
    /// Returns the fraction of the move that was completed.
    pub fn try_move(&mut self, dt: f32, up: Vec3) -> f32 {
        self.hit_wall = false;
        self.hit_normal = None;

        let mut time_left = dt;
        let mut travel_fraction = 0.0;
        let mut planes = ClipPlanes::new(self.velocity);

        for bump in 0..MAX_BUMPS {
            if self.velocity.length() < MIN_MOVE_SPEED {
                break;
            }

            let tr = self.trace(self.position, self.position + self.velocity * time_left);
            travel_fraction += tr.fraction;

            let Some(normal) = tr.hit_normal else {
                self.position = tr.end_position;
                break;
            };

            self.position = tr.end_position + normal * SURFACE_OFFSET;
            planes.start_bump(self.velocity);

            let is_floor = surface_angle(normal, up) < self.max_standable_angle;
            if bump == 0 && !is_floor {
                self.hit_wall = true;
                self.hit_normal = Some(normal);
            }

            time_left -= time_left * tr.fraction;

            let bounce = if is_floor { self.ground_bounce } else { self.wall_bounce };
            if !planes.try_add(normal, &mut self.velocity, bounce) {
                break;
            }
        }

        if travel_fraction == 0.0 {
            self.velocity = Vec3::ZERO;
        }

        travel_fraction
    }

    /// Like [`Self::try_move`], but also try the move lifted by `step_size`
    /// along `up` and keep it when it gets further.
    ///
    /// Returns the fraction moved and how far the kept move stepped along `up`.
    pub fn try_move_with_step(&mut self, dt: f32, step_size: f32, up: Vec3) -> (f32, f32) {
        let start = self.position;

        let mut stepped = self.clone();

        let fraction = self.try_move(dt, up);

        stepped.trace_move(up * step_size);
        let stepped_fraction = stepped.try_move(dt, up);
        let down = stepped.trace_move(-up * step_size);

        // Stepping only counts if it put us back onto something we can stand on.
        let Some(down_normal) = down.hit_normal else {
            return (fraction, 0.0);
        };
        if surface_angle(down_normal, up) > self.max_standable_angle {
            return (fraction, 0.0);
        }

        let regular_distance = planar(self.position - start, up).length_squared();
        let stepped_distance = planar(stepped.position - start, up).length_squared();
        if regular_distance > stepped_distance {
            return (fraction, 0.0);
        }

        let step_amount = (stepped.position - start).dot(up);
        *self = stepped;

        (stepped_fraction, step_amount)
    }

    /// Push the hull out of solid geometry if it starts inside some.
    ///
    /// Returns `false` when no free position was found nearby.
    pub fn try_unstuck(&mut self) -> bool {
        let tr = self.trace(self.position, self.position);
        if !tr.started_in_solid {
            return true;
        }

        for i in 1..UNSTUCK_UP_ATTEMPTS {
            let attempt = self.position + Vec3::Y * i as f32;
            if self.settle_from(attempt) {
                return true;
            }
        }

        let mut rng = random::from_position(self.position);
        for i in 1..UNSTUCK_RANDOM_ATTEMPTS {
            let attempt = self.position + rng.unit_cube() * i as f32;
            if self.settle_from(attempt) {
                return true;
            }
        }

        false
    }

    /// Sweep from a candidate back toward the current position, stopping half a unit short of contact.
    fn settle_from(&mut self, attempt: Vec3) -> bool {
        let tr = self.trace(attempt, self.position);
        if tr.started_in_solid {
            return false;
        }

        let direction = (self.position - attempt).normalize_or_zero();
        let traveled = (tr.end_position - attempt).length();
        self.position = attempt + direction * (traveled - 0.5);
        self.velocity = Vec3::ZERO;

        log::debug!("unstuck to {:?}", self.position);
        true
    }
}

/// Angle between a surface normal and the up axis, in radians.
#[inline]
pub fn surface_angle(normal: Vec3, up: Vec3) -> f32 {
    normal.dot(up).clamp(-1.0, 1.0).acos()
}

/// Remove the `up` component.
#[inline]
fn planar(v: Vec3, up: Vec3) -> Vec3 {
    v - up * v.dot(up)
}
