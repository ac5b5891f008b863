//! Character movement.
//!
//! Movement is split into small mechanics (walk, air move, crouch, sprint,
//! jump, slide, wallrun) that each decide on their own when they are active.
//! Abilities (the grapple) run just before them on the ability button.
//! A [`Scheduler`] runs them in priority order every tick and merges their
//! tags and overrides, and the [`CharacterController`] wraps the scheduler
//! with the per-tick housekeeping: view input, ducking, stuck recovery and
//! footsteps.
//!
//! # Design
//!
//! All timing is counted in whole fixed ticks ([`TickClock`]), so the same
//! commands against the same world always produce the same states and events.
//! Everything a mechanic needs flows through [`MechanicContext`]; the
//! mechanics own no references into the world.

pub mod abilities;
pub mod ability;
pub mod clip_planes;
pub mod command;
pub mod config;
pub mod context;
pub mod controller;
pub mod events;
pub mod math;
pub mod mechanic;
pub mod mechanics;
pub mod scheduler;
pub mod slide_move;
pub mod state;
pub mod time;

pub use abilities::Grapple;
pub use ability::{Abilities, Ability, AbilityId};
pub use clip_planes::{clip_velocity, ClipPlanes};
pub use command::{CommandButtons, PlayerCommand};
pub use config::{ConfigError, MovementConfig, MovementPreset};
pub use context::MechanicContext;
pub use controller::CharacterController;
pub use events::{EventSink, FootstepKind, JumpType, MovementEvent};
pub use mechanic::{Mechanic, MechanicId, MechanicTimers};
pub use scheduler::Scheduler;
pub use slide_move::SlideMove;
pub use state::{
    AbilityOverrides, CharacterState, GrapplePhase, GrappleState, MechanicOverrides, MechanicTags,
};
pub use time::{TickClock, TickStamp};
