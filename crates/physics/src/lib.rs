//! Vaultrun Physics Engine
//!
//! Deterministic first-person parkour movement: walking, sprinting,
//! crouching, sliding, jumping, air jumps, wall-running and wall jumps,
//! driven by a fixed-tick clock against swept hull collision.
//!
//! # Architecture
//!
//! The engine is split into two main systems:
//!
//! - **Collision**: Sweeps the character hull through the world and returns hit information
//! - **Movement**: Prioritized mechanics that use those sweeps to move a character
//!
//! # Design Principles
//!
//! 1. **Determinism**: Same commands always produce the same states and events
//! 2. **Small mechanics**: Each behavior decides its own activation and stays in its own module
//! 3. **Plain data**: Character state is serializable and holds no references

pub mod collision;
pub mod movement;
pub mod random;

// Re-export commonly used types
pub use collision::{
    CollisionWorld, ContentFlags, SurfaceFlags, TraceFilter, TraceResult, TraceShape, WorldQuery,
    WORLD_ENTITY,
};
pub use movement::{
    Abilities, AbilityId, CharacterController, CharacterState, CommandButtons, EventSink,
    FootstepKind, GrapplePhase, JumpType,
    MechanicId, MechanicTags, MovementConfig, MovementEvent, MovementPreset, PlayerCommand,
};
