//! Trace results, shapes and filters for collision queries.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::{ContentFlags, SurfaceFlags};

/// Entity id reported for static world geometry.
pub const WORLD_ENTITY: i32 = -1;

/// Result of sweeping a shape through the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    /// How far along the sweep we got before hitting something.
    ///
    /// - `1.0` = traveled the full distance (no collision)
    /// - `0.0` = hit something immediately at start
    pub fraction: f32,

    /// Position of the shape at `fraction`.
    pub end_position: Vec3,

    /// Contact point on the surface that was hit.
    pub hit_position: Option<Vec3>,

    /// Surface normal at the impact point, pointing away from the surface.
    /// `None` if nothing was hit.
    pub hit_normal: Option<Vec3>,

    /// Content flags of what was hit.
    pub hit_contents: ContentFlags,

    /// Surface flags of the hit surface.
    pub hit_surface: SurfaceFlags,

    /// Whether the sweep started inside solid geometry.
    pub started_in_solid: bool,

    /// Whether the whole sweep was inside solid geometry.
    pub all_solid: bool,

    /// Entity that was hit: [`WORLD_ENTITY`] for static geometry, >= 0 for an entity.
    pub hit_entity: i32,
}

impl Default for TraceResult {
    fn default() -> Self {
        Self::no_hit(Vec3::ZERO)
    }
}

impl TraceResult {
    /// Create a trace result indicating no collision occurred.
    pub fn no_hit(end_position: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_position,
            hit_position: None,
            hit_normal: None,
            hit_contents: ContentFlags::EMPTY,
            hit_surface: SurfaceFlags::NONE,
            started_in_solid: false,
            all_solid: false,
            hit_entity: WORLD_ENTITY,
        }
    }

    /// Create a trace result indicating a collision occurred.
    pub fn hit(fraction: f32, end_position: Vec3, normal: Vec3) -> Self {
        Self {
            fraction,
            end_position,
            hit_position: Some(end_position),
            hit_normal: Some(normal),
            hit_contents: ContentFlags::SOLID,
            hit_surface: SurfaceFlags::NONE,
            started_in_solid: false,
            all_solid: false,
            hit_entity: WORLD_ENTITY,
        }
    }

    /// Check if this trace hit something.
    ///
    /// A sweep that starts in solid counts as a hit even with zero length.
    #[inline]
    pub fn hit_something(&self) -> bool {
        self.hit_normal.is_some()
    }

    /// Hit normal, or zero when nothing was hit.
    #[inline]
    pub fn normal_or_zero(&self) -> Vec3 {
        self.hit_normal.unwrap_or(Vec3::ZERO)
    }
}

/// Shape used for collision sweeps.
///
/// Shapes are positioned by their bottom-center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TraceShape {
    /// An axis-aligned box, the character hull.
    Box {
        /// Half-size in each axis (x, y, z).
        half_extents: Vec3,
    },

    /// A single point. Used for line-of-sight and ray queries.
    Point,
}

impl TraceShape {
    /// Hull box for a character with the given radius and height.
    pub fn hull(radius: f32, height: f32) -> Self {
        Self::Box {
            half_extents: Vec3::new(radius, height * 0.5, radius),
        }
    }

    /// Get the height of this shape.
    pub fn height(&self) -> f32 {
        match self {
            Self::Box { half_extents } => half_extents.y * 2.0,
            Self::Point => 0.0,
        }
    }

    /// Smallest extent of the shape, used to bound sweep sampling.
    pub fn min_extent(&self) -> f32 {
        match self {
            Self::Box { half_extents } => half_extents.min_element() * 2.0,
            Self::Point => 0.0,
        }
    }

    /// Same footprint with the top lowered by `amount`, keeping the bottom in place.
    pub fn shortened(&self, amount: f32) -> Self {
        match *self {
            Self::Box { half_extents } => Self::Box {
                half_extents: Vec3::new(
                    half_extents.x,
                    (half_extents.y - amount * 0.5).max(0.01),
                    half_extents.z,
                ),
            },
            Self::Point => Self::Point,
        }
    }
}

/// Which brushes a sweep may collide with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceFilter {
    /// Contents that block the sweep.
    pub contents: ContentFlags,

    /// Entity whose own brushes and attached descendants are ignored.
    pub ignore_entity: Option<i32>,
}

impl TraceFilter {
    /// Filter used by character movement, ignoring the character itself.
    pub fn player_move(ignore_entity: Option<i32>) -> Self {
        Self {
            contents: ContentFlags::MASK_PLAYER_MOVE,
            ignore_entity,
        }
    }

    /// Whether a brush with these properties blocks this sweep.
    #[inline]
    pub fn accepts(&self, contents: ContentFlags, entity: i32, owner: Option<i32>) -> bool {
        if !self.contents.intersects(contents) {
            return false;
        }

        match self.ignore_entity {
            Some(ignored) => entity != ignored && owner != Some(ignored),
            None => true,
        }
    }
}

impl Default for TraceFilter {
    fn default() -> Self {
        Self::player_move(None)
    }
}

/// World sweep query used by the movement core.
///
/// Implementations must be synchronous and deterministic: the same query
/// against the same world returns the same result.
pub trait WorldQuery {
    /// Sweep `shape` from `start` to `end`.
    fn sweep(&self, start: Vec3, end: Vec3, shape: TraceShape, filter: &TraceFilter) -> TraceResult;
}
