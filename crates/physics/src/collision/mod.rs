//! Collision queries for character movement.
//!
//! Movement never talks to a physics engine directly. It asks a [`WorldQuery`]
//! to sweep the character hull from one point to another and reacts to the
//! returned [`TraceResult`]. [`CollisionWorld`] is the parry3d implementation
//! used by the game and the tests.
//!
//! # Key Types
//!
//! - [`WorldQuery`]: The sweep interface consumed by movement
//! - [`CollisionWorld`]: Brush-based world built on parry3d shapes
//! - [`TraceResult`]: Output from a sweep
//! - [`TraceShape`]: Shape being swept (hull box or point)
//! - [`TraceFilter`]: Content mask and ignored owner for a sweep
//!
//! # Tracing Algorithm
//!
//! Sweeps return:
//! - How far the shape traveled (fraction 0.0-1.0)
//! - The final position, backed off from the hit surface
//! - The outward surface normal at impact (if any)
//! - Content and surface flags of what was hit

mod flags;
mod trace;
mod world;

pub use flags::{ContentFlags, SurfaceFlags};
pub use trace::{TraceFilter, TraceResult, TraceShape, WorldQuery, WORLD_ENTITY};
pub use world::{CollisionWorld, Penetration};
