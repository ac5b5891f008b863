//! Level geometry and spawn points.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use vaultrun_physics::{CollisionWorld, ContentFlags, SurfaceFlags};

/// A level: static collision geometry plus the places characters start.
#[derive(Debug)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Collision world for physics.
    pub collision: CollisionWorld,

    /// Player spawn points.
    pub spawn_points: Vec<SpawnPoint>,
}

/// A spawn point for a player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Position in world space (feet of the character).
    pub position: Vec3,

    /// Initial facing direction (yaw in radians).
    pub facing: f32,
}

impl Level {
    /// Create an empty level.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            collision: CollisionWorld::new(),
            spawn_points: Vec::new(),
        }
    }

    /// A flat floor with a single spawn at the origin.
    pub fn flat() -> Self {
        let mut level = Self::new("flat", "Flat Ground");
        level.collision.add_box(
            Vec3::new(0.0, -8.0, 0.0),
            Vec3::new(4000.0, 8.0, 4000.0),
            ContentFlags::SOLID,
        );
        level.spawn_points.push(SpawnPoint {
            position: Vec3::ZERO,
            facing: 0.0,
        });
        level
    }

    /// The parkour test course.
    ///
    /// Runs along +X from the spawn: a run-up, a wall on the left for
    /// wall-running, a small step, a crate to jump onto, a low tunnel that
    /// must be crouched or slid through, and a ramp at the end.
    pub fn test_course() -> Self {
        let mut level = Self::new("test_course", "Parkour Test Course");

        // Floor, x -400..3600
        level.collision.add_box(
            Vec3::new(1600.0, -8.0, 0.0),
            Vec3::new(2000.0, 8.0, 600.0),
            ContentFlags::SOLID,
        );

        // Wallrun wall on the left, face at z = -96
        let wall = level.collision.add_box(
            Vec3::new(1000.0, 200.0, -116.0),
            Vec3::new(400.0, 200.0, 20.0),
            ContentFlags::SOLID,
        );
        level.collision.set_surface(wall, SurfaceFlags::METAL);

        // Step, low enough to walk up
        level.collision.add_box(
            Vec3::new(1650.0, 8.0, 0.0),
            Vec3::new(50.0, 8.0, 600.0),
            ContentFlags::SOLID,
        );

        // Crate
        let crate_box = level.collision.add_box(
            Vec3::new(2000.0, 20.0, 0.0),
            Vec3::new(60.0, 20.0, 200.0),
            ContentFlags::SOLID,
        );
        level.collision.set_surface(crate_box, SurfaceFlags::WOOD);

        // Tunnel ceiling, underside at y = 56
        level.collision.add_box(
            Vec3::new(2500.0, 96.0, 0.0),
            Vec3::new(150.0, 40.0, 600.0),
            ContentFlags::SOLID,
        );

        // Gravel ramp rising toward +X
        let ramp = level.collision.add_oriented_box(
            Vec3::new(3200.0, -40.0, 0.0),
            Vec3::new(200.0, 50.0, 300.0),
            Quat::from_rotation_z(20f32.to_radians()),
            ContentFlags::SOLID,
        );
        level.collision.set_surface(ramp, SurfaceFlags::GRAVEL);

        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(0.0, 0.0, 0.0),
            facing: 0.0,
        });
        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(0.0, 0.0, 120.0),
            facing: 0.0,
        });

        level
    }

    /// Get a player spawn point.
    pub fn player_spawn(&self, index: usize) -> Option<&SpawnPoint> {
        self.spawn_points.get(index)
    }

    /// Get the number of player spawn points.
    pub fn player_spawn_count(&self) -> usize {
        self.spawn_points.len()
    }
}
