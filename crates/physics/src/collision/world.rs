//! Collision world containing the static and attached geometry of a level.
//!
//! The world answers [`WorldQuery::sweep`] by sampling the swept path for the
//! first overlapping position and then bisecting down to the contact.
//!
//! Overlap is an intersection test against a hull inset by the penetration
//! tolerance. Both shapes are convex, so along a straight sweep the set of
//! overlapping positions is a single interval and bisection converges on
//! its entry. Contact geometry is only computed once overlap is confirmed.

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::query::{contact, intersection_test, PointQuery};
use parry3d::shape::SharedShape;

use super::flags::{ContentFlags, SurfaceFlags};
use super::trace::{TraceFilter, TraceResult, TraceShape, WorldQuery, WORLD_ENTITY};

/// Overlap deeper than this counts as solid. Resting contact does not.
const PENETRATION_TOLERANCE: f32 = 0.01;

/// Sweeps shorter than this only test the start position.
const MIN_SWEEP_DISTANCE: f32 = 0.0001;

/// Upper bound on coarse samples along one sweep.
const MAX_SWEEP_SAMPLES: usize = 64;

/// Bisection steps after the first overlapping sample.
const BISECT_ITERATIONS: usize = 16;

/// A piece of collision geometry in the world.
#[derive(Debug, Clone)]
pub struct CollisionBrush {
    /// Unique identifier for this brush.
    pub id: u32,
    /// The collision shape.
    pub shape: SharedShape,
    /// Position and orientation in world space.
    pub transform: Isometry<Real>,
    /// Content flags (solid, clip, trigger).
    pub contents: ContentFlags,
    /// Surface material flags.
    pub surface: SurfaceFlags,
    /// Entity this brush belongs to, [`WORLD_ENTITY`] for static geometry.
    pub entity: i32,
    /// Parent entity when the brush is attached to another entity.
    pub owner: Option<i32>,
}

/// Deepest overlap between a placed shape and the world.
#[derive(Debug, Clone, Copy)]
pub struct Penetration {
    /// Outward normal of the brush, pointing toward the tested shape.
    pub normal: Vec3,
    /// Penetration depth.
    pub depth: f32,
    /// Contact point on the brush surface.
    pub point: Vec3,
    pub contents: ContentFlags,
    pub surface: SurfaceFlags,
    pub entity: i32,
}

/// The collision world containing all geometry.
///
/// Supports axis-aligned boxes, oriented boxes (slopes, curved walls built
/// from segments) and convex hulls.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    brushes: Vec<CollisionBrush>,
    next_id: u32,
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self {
            brushes: Vec::new(),
            next_id: 0,
        }
    }

    /// Add an axis-aligned box to the world.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    /// * `contents` - Content flags for collision filtering
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, contents: ContentFlags) -> u32 {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, contents)
    }

    /// Add a rotated box to the world.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        contents: ContentFlags,
    ) -> u32 {
        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        let (axis, angle) = rotation.to_axis_angle();
        let scaled_axis = axis * angle;

        let transform = Isometry::new(
            Vector::new(center.x, center.y, center.z),
            Vector::new(scaled_axis.x, scaled_axis.y, scaled_axis.z),
        );

        self.push_brush(shape, transform, contents)
    }

    /// Add a convex hull to the world.
    ///
    /// Returns `None` if the hull couldn't be computed from the points.
    pub fn add_convex_hull(&mut self, points: &[Vec3], contents: ContentFlags) -> Option<u32> {
        let parry_points: Vec<Point<Real>> =
            points.iter().map(|p| Point::new(p.x, p.y, p.z)).collect();

        let shape = SharedShape::convex_hull(&parry_points)?;

        Some(self.push_brush(shape, Isometry::identity(), contents))
    }

    /// Set the surface flags of a brush.
    pub fn set_surface(&mut self, brush_id: u32, surface: SurfaceFlags) {
        if let Some(brush) = self.brushes.iter_mut().find(|b| b.id == brush_id) {
            brush.surface = surface;
        }
    }

    /// Assign a brush to an entity, optionally attached to a parent entity.
    pub fn attach(&mut self, brush_id: u32, entity: i32, owner: Option<i32>) {
        if let Some(brush) = self.brushes.iter_mut().find(|b| b.id == brush_id) {
            brush.entity = entity;
            brush.owner = owner;
        }
    }

    /// Remove all collision geometry.
    pub fn clear(&mut self) {
        self.brushes.clear();
    }

    /// Get the number of collision brushes.
    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    /// Sweep a shape through the world.
    ///
    /// # Arguments
    ///
    /// * `start` - Starting position (bottom-center of shape)
    /// * `end` - Desired end position
    /// * `shape` - The shape to sweep
    /// * `filter` - Contents and entities the sweep collides with
    pub fn trace(&self, start: Vec3, end: Vec3, shape: TraceShape, filter: &TraceFilter) -> TraceResult {
        let delta = end - start;
        let distance = delta.length();

        let probe = Probe::new(shape);

        if let Some(hit) = self.deepest_penetration(start, shape, filter) {
            let all_solid = distance < MIN_SWEEP_DISTANCE || self.overlaps_any(&probe, end, filter);

            return TraceResult {
                fraction: 0.0,
                end_position: start,
                hit_position: Some(hit.point),
                hit_normal: Some(hit.normal),
                hit_contents: hit.contents,
                hit_surface: hit.surface,
                started_in_solid: true,
                all_solid,
                hit_entity: hit.entity,
            };
        }

        if distance < MIN_SWEEP_DISTANCE {
            return TraceResult::no_hit(start);
        }

        // Coarse pass: never step further than half the shape's smallest extent,
        // so thin walls cannot be skipped over.
        let step = (shape.min_extent() * 0.5).max(1.0);
        let samples = ((distance / step).ceil() as usize).clamp(1, MAX_SWEEP_SAMPLES);

        let mut lo = 0.0_f32;
        let mut hi = None;

        for i in 1..=samples {
            let t = i as f32 / samples as f32;
            if self.overlaps_any(&probe, start + delta * t, filter) {
                hi = Some(t);
                break;
            }
            lo = t;
        }

        let Some(mut hi) = hi else {
            return TraceResult::no_hit(end);
        };

        for _ in 0..BISECT_ITERATIONS {
            let mid = (lo + hi) * 0.5;
            if self.overlaps_any(&probe, start + delta * mid, filter) {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let end_position = start + delta * lo;

        match self.deepest_penetration(start + delta * hi, shape, filter) {
            Some(hit) => TraceResult {
                fraction: lo,
                end_position,
                hit_position: Some(hit.point),
                hit_normal: Some(hit.normal),
                hit_contents: hit.contents,
                hit_surface: hit.surface,
                started_in_solid: false,
                all_solid: false,
                hit_entity: hit.entity,
            },
            None => TraceResult::hit(lo, end_position, -delta / distance),
        }
    }

    /// Check if a shape placed at `position` overlaps solid geometry.
    pub fn point_in_solid(&self, position: Vec3, shape: TraceShape, filter: &TraceFilter) -> bool {
        self.overlaps_any(&Probe::new(shape), position, filter)
    }

    fn overlaps_any(&self, probe: &Probe, position: Vec3, filter: &TraceFilter) -> bool {
        let transform = shape_transform(position, probe.shape);
        self.brushes
            .iter()
            .filter(|brush| filter.accepts(brush.contents, brush.entity, brush.owner))
            .any(|brush| probe.overlaps(&transform, brush))
    }

    /// Find the deepest overlap of a placed shape with any accepted brush.
    pub fn deepest_penetration(
        &self,
        position: Vec3,
        shape: TraceShape,
        filter: &TraceFilter,
    ) -> Option<Penetration> {
        let probe = Probe::new(shape);
        let test_transform = shape_transform(position, shape);

        let mut deepest: Option<Penetration> = None;

        for brush in &self.brushes {
            if !filter.accepts(brush.contents, brush.entity, brush.owner) {
                continue;
            }
            if !probe.overlaps(&test_transform, brush) {
                continue;
            }

            let (normal, depth, point) = match contact(
                &test_transform,
                probe.full.as_ref(),
                &brush.transform,
                brush.shape.as_ref(),
                0.0,
            ) {
                Ok(Some(result)) if result.dist < 0.0 => (
                    Vec3::new(result.normal2.x, result.normal2.y, result.normal2.z),
                    -result.dist,
                    Vec3::new(result.point2.x, result.point2.y, result.point2.z),
                ),
                _ => estimate_penetration(position, shape, brush),
            };

            if deepest.map_or(true, |d| depth > d.depth) {
                deepest = Some(Penetration {
                    normal,
                    depth,
                    point,
                    contents: brush.contents,
                    surface: brush.surface,
                    entity: brush.entity,
                });
            }
        }

        deepest
    }

    fn push_brush(&mut self, shape: SharedShape, transform: Isometry<Real>, contents: ContentFlags) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        self.brushes.push(CollisionBrush {
            id,
            shape,
            transform,
            contents,
            surface: SurfaceFlags::NONE,
            entity: WORLD_ENTITY,
            owner: None,
        });

        id
    }
}

impl WorldQuery for CollisionWorld {
    fn sweep(&self, start: Vec3, end: Vec3, shape: TraceShape, filter: &TraceFilter) -> TraceResult {
        self.trace(start, end, shape, filter)
    }
}

/// A trace shape in both its full size and inset by the penetration tolerance.
struct Probe {
    shape: TraceShape,
    full: SharedShape,
    inset: SharedShape,
}

impl Probe {
    fn new(shape: TraceShape) -> Self {
        Self {
            shape,
            full: create_parry_shape(shape, 0.0),
            inset: create_parry_shape(shape, PENETRATION_TOLERANCE),
        }
    }

    /// Whether the shape sinks deeper than the tolerance into `brush`.
    fn overlaps(&self, transform: &Isometry<Real>, brush: &CollisionBrush) -> bool {
        intersection_test(transform, self.inset.as_ref(), &brush.transform, brush.shape.as_ref())
            .unwrap_or(false)
    }
}

fn create_parry_shape(shape: TraceShape, inset: f32) -> SharedShape {
    match shape {
        TraceShape::Box { half_extents } => {
            let half = (half_extents - Vec3::splat(inset)).max(Vec3::splat(PENETRATION_TOLERANCE));
            SharedShape::cuboid(half.x, half.y, half.z)
        }
        // Tiny sphere stands in for a point
        TraceShape::Point => SharedShape::ball(0.001),
    }
}

/// Separating direction and depth from the brush surface point nearest the
/// shape's center. Used when the contact query gives no answer.
fn estimate_penetration(position: Vec3, shape: TraceShape, brush: &CollisionBrush) -> (Vec3, f32, Vec3) {
    let half_extents = match shape {
        TraceShape::Box { half_extents } => half_extents,
        TraceShape::Point => Vec3::ZERO,
    };
    let center = position + Vec3::Y * half_extents.y;

    let projection = brush.shape.project_point(
        &brush.transform,
        &Point::new(center.x, center.y, center.z),
        false,
    );
    let surface = Vec3::new(projection.point.x, projection.point.y, projection.point.z);
    let offset = center - surface;
    let distance = offset.length();

    if distance <= f32::EPSILON {
        return (Vec3::Y, half_extents.y.max(PENETRATION_TOLERANCE), surface);
    }

    let (normal, signed_distance) = if projection.is_inside {
        (-offset / distance, -distance)
    } else {
        (offset / distance, distance)
    };
    let extent = half_extents.dot(normal.abs());

    (normal, (extent - signed_distance).max(PENETRATION_TOLERANCE), surface)
}

/// Shapes are placed by their bottom-center.
fn shape_transform(position: Vec3, shape: TraceShape) -> Isometry<Real> {
    let offset_y = match shape {
        TraceShape::Box { half_extents } => half_extents.y,
        TraceShape::Point => 0.0,
    };

    Isometry::translation(position.x, position.y + offset_y, position.z)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hull() -> TraceShape {
        TraceShape::hull(16.0, 72.0)
    }

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();

        // Floor with its top at y=0
        world.add_box(
            Vec3::new(0.0, -8.0, 0.0),
            Vec3::new(1000.0, 8.0, 1000.0),
            ContentFlags::SOLID,
        );

        // Wall whose -X face is at x=200
        world.add_box(
            Vec3::new(208.0, 100.0, 0.0),
            Vec3::new(8.0, 100.0, 500.0),
            ContentFlags::SOLID,
        );

        world
    }

    #[test]
    fn test_sweep_stops_at_wall() {
        let world = create_test_world();
        let filter = TraceFilter::default();

        let result = world.trace(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(400.0, 1.0, 0.0),
            hull(),
            &filter,
        );

        assert!(result.hit_something());
        assert!(!result.started_in_solid);
        // Hull front face reaches x=200 when its center is at x=184
        assert!((result.end_position.x - 184.0).abs() < 0.5, "end x = {}", result.end_position.x);

        let normal = result.hit_normal.unwrap();
        assert!(normal.dot(-Vec3::X) > 0.99, "normal {normal:?} should face the hull");
    }

    #[test]
    fn test_sweep_down_finds_floor() {
        let world = create_test_world();

        let result = world.trace(
            Vec3::new(0.0, 20.0, 0.0),
            Vec3::new(0.0, -20.0, 0.0),
            hull(),
            &TraceFilter::default(),
        );

        assert!(result.hit_something());
        assert!(result.end_position.y.abs() < 0.05, "end y = {}", result.end_position.y);
        assert!(result.hit_normal.unwrap().dot(Vec3::Y) > 0.99);
        assert_eq!(result.hit_entity, WORLD_ENTITY);
    }

    #[test]
    fn test_resting_contact_is_not_solid() {
        let world = create_test_world();

        assert!(!world.point_in_solid(Vec3::ZERO, hull(), &TraceFilter::default()));
        assert!(world.point_in_solid(Vec3::new(0.0, -4.0, 0.0), hull(), &TraceFilter::default()));
    }

    #[test]
    fn test_every_depth_inside_floor_is_solid() {
        let world = create_test_world();
        let filter = TraceFilter::default();

        for step in 1..=16 {
            let depth = step as f32 * 0.5;
            let position = Vec3::new(0.0, -depth, 0.0);

            assert!(world.point_in_solid(position, hull(), &filter), "hull {depth} units into the floor");

            let hit = world
                .deepest_penetration(position, hull(), &filter)
                .expect("overlap should report a penetration");
            assert!(hit.normal.dot(Vec3::Y) > 0.99, "normal {:?} at depth {depth}", hit.normal);
            assert!((hit.depth - depth).abs() < 0.5, "depth {} reported for {depth}", hit.depth);
        }
    }

    #[test]
    fn test_sweep_never_ends_inside_floor() {
        let world = create_test_world();
        let filter = TraceFilter::default();

        for start_height in [0.25_f32, 0.5, 1.0, 2.0, 7.5, 20.0, 64.0] {
            let result = world.trace(
                Vec3::new(0.0, start_height, 0.0),
                Vec3::new(0.0, -20.0, 0.0),
                hull(),
                &filter,
            );

            assert!(result.hit_something(), "sweep from {start_height} missed the floor");
            assert!(
                result.end_position.y.abs() < 0.05,
                "sweep from {start_height} ended at y = {}",
                result.end_position.y
            );
            assert!(!world.point_in_solid(result.end_position, hull(), &filter));
        }
    }

    #[test]
    fn test_started_in_solid() {
        let world = create_test_world();

        let result = world.trace(
            Vec3::new(0.0, -4.0, 0.0),
            Vec3::new(0.0, -4.0, 0.0),
            hull(),
            &TraceFilter::default(),
        );

        assert!(result.started_in_solid);
        assert!(result.all_solid);
        assert_eq!(result.fraction, 0.0);
    }

    #[test]
    fn test_thin_wall_is_not_tunneled() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(100.0, 50.0, 0.0), Vec3::new(1.0, 50.0, 100.0), ContentFlags::SOLID);

        let result = world.trace(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(300.0, 1.0, 0.0),
            hull(),
            &TraceFilter::default(),
        );

        assert!(result.hit_something());
        assert!(result.end_position.x < 100.0);
    }

    #[test]
    fn test_content_mask_filtering() {
        let mut world = CollisionWorld::new();

        world.add_box(Vec3::new(100.0, 50.0, 0.0), Vec3::new(8.0, 50.0, 100.0), ContentFlags::SOLID);
        world.add_box(Vec3::new(50.0, 50.0, 0.0), Vec3::new(8.0, 50.0, 100.0), ContentFlags::TRIGGER);

        let result = world.trace(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(200.0, 1.0, 0.0),
            hull(),
            &TraceFilter::default(),
        );

        assert!(result.hit_something());
        // Stops at the solid wall (face at x=92), not the trigger
        assert!((result.end_position.x - 76.0).abs() < 0.5, "end x = {}", result.end_position.x);
    }

    #[test]
    fn test_ignored_entity_is_passed_through() {
        let mut world = CollisionWorld::new();
        let id = world.add_box(Vec3::new(100.0, 50.0, 0.0), Vec3::new(8.0, 50.0, 100.0), ContentFlags::SOLID);
        world.attach(id, 3, None);

        let start = Vec3::new(0.0, 1.0, 0.0);
        let end = Vec3::new(200.0, 1.0, 0.0);

        assert!(world.trace(start, end, hull(), &TraceFilter::player_move(None)).hit_something());
        assert!(!world.trace(start, end, hull(), &TraceFilter::player_move(Some(3))).hit_something());
    }

    #[test]
    fn test_oriented_box_slope_normal() {
        let mut world = CollisionWorld::new();
        // 30 degree ramp rising toward +X
        let rotation = Quat::from_rotation_z(30f32.to_radians());
        world.add_oriented_box(Vec3::new(0.0, -50.0, 0.0), Vec3::new(500.0, 50.0, 500.0), rotation, ContentFlags::SOLID);

        let result = world.trace(
            Vec3::new(0.0, 100.0, 0.0),
            Vec3::new(0.0, -100.0, 0.0),
            hull(),
            &TraceFilter::default(),
        );

        let normal = result.hit_normal.expect("ramp should be hit");
        let angle = normal.angle_between(Vec3::Y).to_degrees();
        assert!((angle - 30.0).abs() < 1.0, "slope angle = {angle}");
    }
}
