//! Player entity and state.

use glam::Vec3;
use vaultrun_physics::movement::TickClock;
use vaultrun_physics::{
    CharacterController, CharacterState, EventSink, MechanicTags, MovementConfig, PlayerCommand,
    WorldQuery,
};

use crate::input::{InputSampler, PlayerInput};
use crate::level::SpawnPoint;

/// Unique identifier for entities.
pub type EntityId = u32;

/// A player in the game.
///
/// Each player owns its movement controller, since mechanic activation
/// history is per character.
#[derive(Debug)]
pub struct Player {
    /// Unique player ID.
    pub id: EntityId,

    /// Player name/handle.
    pub name: String,

    /// Movement physics state.
    pub state: CharacterState,

    /// Index of the spawn point this player restarts at.
    pub spawn_index: usize,

    /// Times this player has restarted.
    pub restarts: u32,

    controller: CharacterController,
    sampler: InputSampler,
}

impl Player {
    /// Create a new player standing at a spawn point.
    pub fn new(
        id: EntityId,
        name: String,
        spawn_index: usize,
        spawn: &SpawnPoint,
        controller: CharacterController,
        tick_delta: f32,
        world: &dyn WorldQuery,
    ) -> Self {
        let mut state = CharacterState::new(spawn.position, &controller.config);
        state.clock = TickClock::new(tick_delta);

        let mut player = Self {
            id,
            name,
            state,
            spawn_index,
            restarts: 0,
            controller,
            sampler: InputSampler::new(),
        };
        player.respawn(spawn, world);
        player
    }

    pub fn config(&self) -> &MovementConfig {
        &self.controller.config
    }

    /// Get the player's current position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    /// Get the player's eye position (for camera).
    #[inline]
    pub fn eye_position(&self) -> Vec3 {
        self.state.eye_position()
    }

    /// Get the direction the player is looking.
    #[inline]
    pub fn look_direction(&self) -> Vec3 {
        self.state.look_direction()
    }

    /// Get the player's forward direction (horizontal only).
    #[inline]
    pub fn forward_direction(&self) -> Vec3 {
        self.state.forward_direction()
    }

    /// Horizontal speed in units/second.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.state.horizontal_velocity().length()
    }

    /// Check if the player is on the ground.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded()
    }

    #[inline]
    pub fn is_crouching(&self) -> bool {
        self.state.has_tag(MechanicTags::CROUCH)
    }

    #[inline]
    pub fn is_sliding(&self) -> bool {
        self.state.has_tag(MechanicTags::SLIDE)
    }

    #[inline]
    pub fn is_wallrunning(&self) -> bool {
        self.state.has_tag(MechanicTags::WALLRUN)
    }

    /// Put the player back at a spawn point, facing its direction.
    ///
    /// Buttons held across the respawn stay held; they do not count as new presses.
    pub fn respawn(&mut self, spawn: &SpawnPoint, world: &dyn WorldQuery) {
        self.state.eye_angles = Vec3::new(0.0, spawn.facing, 0.0);
        self.controller.spawn_at(&mut self.state, spawn.position, world);
    }

    /// Turn this tick's raw input into a command.
    pub fn sample(&mut self, input: &PlayerInput, mouse_sensitivity: f32) -> PlayerCommand {
        self.sampler.sample(input, mouse_sensitivity)
    }

    /// Run one movement tick.
    pub fn step(&mut self, command: &PlayerCommand, world: &dyn WorldQuery, sink: &mut dyn EventSink) {
        self.controller.tick(&mut self.state, command, world, sink);
    }

    /// Sample input and run one movement tick.
    pub fn simulate(
        &mut self,
        input: &PlayerInput,
        mouse_sensitivity: f32,
        world: &dyn WorldQuery,
        sink: &mut dyn EventSink,
    ) {
        let command = self.sample(input, mouse_sensitivity);
        self.step(&command, world, sink);
    }
}
