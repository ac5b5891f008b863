//! Vaultrun Game Logic
//!
//! This crate hosts vaultrun characters in a game:
//!
//! - Player input sampling with button edge detection
//! - Levels with collision geometry and spawn points
//! - The fixed-tick simulation, restarts and the movement event log
//! - Eye-angle replication for remote observers
//!
//! # Architecture
//!
//! The simulation is deterministic. All state updates are driven by player
//! input and a fixed timestep.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Game Simulation                         │
//! │  ┌─────────┐    ┌──────────┐    ┌────────────────────────┐  │
//! │  │ Input   │───►│ Movement │───►│ Player state           │  │
//! │  │ Sampler │    │ (mechanics,   │ + event log            │  │
//! │  └─────────┘    │ collision)    │                        │  │
//! │                 └──────────┘    └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod input;
pub mod level;
pub mod player;
pub mod replication;
pub mod simulation;

// Re-export main types
pub use input::{InputSampler, PlayerInput};
pub use level::{Level, SpawnPoint};
pub use player::{EntityId, Player};
pub use replication::{CodecError, EyeAngles, RemoteView};
pub use simulation::{EventLog, LoggedEvent, Simulation, SimulationConfig, SpawnError};

// Re-export physics types for convenience
pub use vaultrun_physics::{
    CharacterController, CharacterState, CollisionWorld, ContentFlags, JumpType, MovementConfig,
    MovementEvent, MovementPreset, PlayerCommand, TraceResult, TraceShape,
};
