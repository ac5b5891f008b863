//! Velocity clipping against the planes touched during one move.

use glam::Vec3;

/// Maximum number of planes a single move can collect.
pub const MAX_CLIP_PLANES: usize = 5;

/// Clip a velocity so it no longer moves into a plane.
///
/// `overbounce` above 1 reflects some of the velocity back out of the plane.
pub fn clip_velocity(input: Vec3, normal: Vec3, overbounce: f32) -> Vec3 {
    let backoff = input.dot(normal) * overbounce;
    let mut output = input - normal * backoff;

    // One more pass in case rounding left us moving through the plane.
    let adjust = output.dot(normal);
    if adjust < 0.0 {
        output -= normal * adjust;
    }

    output
}

/// Contact planes accumulated over the bumps of a single move.
#[derive(Debug, Clone)]
pub struct ClipPlanes {
    original_velocity: Vec3,
    bump_velocity: Vec3,
    planes: [Vec3; MAX_CLIP_PLANES],
    count: usize,
}

impl ClipPlanes {
    pub fn new(original_velocity: Vec3) -> Self {
        Self {
            original_velocity,
            bump_velocity: original_velocity,
            planes: [Vec3::ZERO; MAX_CLIP_PLANES],
            count: 0,
        }
    }

    /// Number of planes held.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn max(&self) -> usize {
        MAX_CLIP_PLANES
    }

    /// Start a new bump from the given velocity.
    #[inline]
    pub fn start_bump(&mut self, velocity: Vec3) {
        self.bump_velocity = velocity;
    }

    /// Add a plane and restrain `velocity` to it and every plane before it.
    ///
    /// Returns `false` once the set is full. The velocity is zeroed in that case.
    pub fn try_add(&mut self, normal: Vec3, velocity: &mut Vec3, bounce: f32) -> bool {
        if self.count == MAX_CLIP_PLANES {
            *velocity = Vec3::ZERO;
            return false;
        }

        self.planes[self.count] = normal;
        self.count += 1;

        if self.count == 1 {
            self.bump_velocity = clip_velocity(self.bump_velocity, normal, 1.0 + bounce);
            *velocity = self.bump_velocity;
            return true;
        }

        *velocity = self.bump_velocity;
        if self.try_clip(velocity) {
            if self.count != 2 {
                // Wedged into a corner of three or more planes.
                *velocity = Vec3::ZERO;
                return true;
            }

            let crease = self.planes[0].cross(self.planes[1]).normalize_or_zero();
            *velocity = crease * crease.dot(*velocity);
        }

        // Moving against the original intention, stop instead of oscillating.
        if velocity.dot(self.original_velocity) < 0.0 {
            *velocity = Vec3::ZERO;
        }

        true
    }

    /// Clip the bump velocity to each plane in turn.
    ///
    /// Returns `true` as soon as a clipped velocity still drives into another
    /// plane, leaving that clipped velocity in `velocity`.
    fn try_clip(&self, velocity: &mut Vec3) -> bool {
        for i in 0..self.count {
            *velocity = clip_velocity(self.bump_velocity, self.planes[i], 1.0);

            if self.moves_into_other_plane(*velocity, i) {
                return true;
            }
        }

        false
    }

    fn moves_into_other_plane(&self, velocity: Vec3, skip: usize) -> bool {
        self.planes[..self.count]
            .iter()
            .enumerate()
            .any(|(j, plane)| j != skip && velocity.dot(*plane) < 0.0)
    }
}
