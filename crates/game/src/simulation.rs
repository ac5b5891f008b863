//! Game simulation - the fixed-tick loop.
//!
//! This module advances every player by one fixed tick per call, feeding
//! sampled input through each player's movement controller and collecting
//! the movement events they raise.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vaultrun_physics::{
    CharacterController, CommandButtons, EventSink, FootstepKind, JumpType, MovementConfig,
    MovementEvent, MovementPreset, SurfaceFlags,
};

use crate::input::PlayerInput;
use crate::level::Level;
use crate::player::{EntityId, Player};

/// Errors from placing players into the level.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("level '{level}' has no player spawn points")]
    NoSpawnPoint { level: String },

    #[error("no player with id {0}")]
    UnknownPlayer(EntityId),
}

/// Game simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Movement physics configuration.
    pub movement: MovementConfig,

    /// Mouse sensitivity.
    pub mouse_sensitivity: f32,

    /// Sprint whenever moving forward, without holding the sprint button.
    pub auto_sprint: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 64,
            movement: MovementConfig::default(),
            mouse_sensitivity: 2.0,
            auto_sprint: false,
        }
    }
}

impl SimulationConfig {
    /// Default settings with the movement of a named preset.
    pub fn with_preset(preset: MovementPreset) -> Self {
        Self {
            movement: preset.config(),
            ..Default::default()
        }
    }

    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}

/// A movement event tagged with who raised it and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub frame: u64,
    pub player: EntityId,
    pub event: MovementEvent,
}

/// Movement events collected from every player, in the order they happened.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn entries(&self) -> &[LoggedEvent] {
        &self.entries
    }

    /// Events raised by one player.
    pub fn for_player(&self, player: EntityId) -> impl Iterator<Item = &LoggedEvent> + '_ {
        self.entries.iter().filter(move |e| e.player == player)
    }

    /// Take every collected event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<LoggedEvent> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A sink recording into this log on behalf of one player.
    pub fn recorder(&mut self, frame: u64, player: EntityId) -> EventRecorder<'_> {
        EventRecorder {
            log: self,
            frame,
            player,
        }
    }
}

/// [`EventSink`] that appends to an [`EventLog`].
pub struct EventRecorder<'a> {
    log: &'a mut EventLog,
    frame: u64,
    player: EntityId,
}

impl EventRecorder<'_> {
    fn record(&mut self, event: MovementEvent) {
        self.log.entries.push(LoggedEvent {
            frame: self.frame,
            player: self.player,
            event,
        });
    }
}

impl EventSink for EventRecorder<'_> {
    fn on_jump(&mut self, jump_type: JumpType) {
        self.record(MovementEvent::Jumped(jump_type));
    }

    fn on_landed(&mut self, fall_speed: f32, fall_height: f32, hard: bool) {
        self.record(MovementEvent::Landed {
            fall_speed,
            fall_height,
            hard,
        });
    }

    fn on_fast_wall_jump(&mut self, speed_delta: f32, time_since_wall_touch: f32) {
        self.record(MovementEvent::FastWallJump {
            speed_delta,
            time_since_wall_touch,
        });
    }

    fn on_footstep(&mut self, kind: FootstepKind, quiet: bool, surface: SurfaceFlags) {
        self.record(MovementEvent::Footstep {
            kind,
            quiet,
            surface,
        });
    }

    fn on_grapple_attached(&mut self, anchor: Vec3) {
        self.record(MovementEvent::GrappleAttached { anchor });
    }

    fn on_grapple_released(&mut self) {
        self.record(MovementEvent::GrappleReleased);
    }
}

/// The main game simulation.
///
/// This contains all game state and advances it deterministically based on
/// player inputs: the same level, config and input stream always produce the
/// same states and events.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current level.
    pub level: Level,

    /// All players in the game.
    pub players: Vec<Player>,

    /// Movement events raised since the log was last drained.
    pub events: EventLog,

    /// Next entity ID to assign.
    next_entity_id: EntityId,
}

impl Simulation {
    /// Create a new simulation with the given configuration and level.
    pub fn new(config: SimulationConfig, level: Level) -> Self {
        Self {
            frame: 0,
            config,
            level,
            players: Vec::new(),
            events: EventLog::default(),
            next_entity_id: 1,
        }
    }

    /// Create a simulation with default configuration and the test course.
    pub fn test() -> Self {
        Self::new(SimulationConfig::default(), Level::test_course())
    }

    /// Add a player to the simulation at the next free spawn point.
    ///
    /// Returns the player's ID.
    pub fn add_player(&mut self, name: &str) -> Result<EntityId, SpawnError> {
        let spawn_count = self.level.player_spawn_count();
        if spawn_count == 0 {
            return Err(SpawnError::NoSpawnPoint {
                level: self.level.id.clone(),
            });
        }

        let spawn_index = self.players.len() % spawn_count;
        let spawn = self
            .level
            .player_spawn(spawn_index)
            .ok_or_else(|| SpawnError::NoSpawnPoint {
                level: self.level.id.clone(),
            })?;

        let mut controller = CharacterController::new(self.config.movement.clone());
        controller.auto_sprint = self.config.auto_sprint;

        let id = self.next_entity_id;
        self.next_entity_id += 1;

        let player = Player::new(
            id,
            name.to_string(),
            spawn_index,
            spawn,
            controller,
            self.config.delta_time(),
            &self.level.collision,
        );
        log::debug!("player {id} '{name}' spawned at {}", player.position());

        self.players.push(player);
        Ok(id)
    }

    /// Remove a player from the simulation.
    pub fn remove_player(&mut self, player_id: EntityId) {
        self.players.retain(|p| p.id != player_id);
    }

    /// Get a player by ID.
    pub fn get_player(&self, player_id: EntityId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Get a mutable reference to a player by ID.
    pub fn get_player_mut(&mut self, player_id: EntityId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Send a player back to their spawn point.
    pub fn restart_player(&mut self, player_id: EntityId) -> Result<(), SpawnError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(SpawnError::UnknownPlayer(player_id))?;

        restart(&self.level, player)
    }

    /// Advance the simulation by one tick.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Player inputs indexed by player position in the `players` array
    pub fn tick(&mut self, inputs: &[PlayerInput]) {
        let world = &self.level.collision;

        for (i, player) in self.players.iter_mut().enumerate() {
            // Get input for this player (default if not provided)
            let input = inputs.get(i).cloned().unwrap_or_default();
            let command = player.sample(&input, self.config.mouse_sensitivity);

            if command.was_pressed(CommandButtons::RESTART) {
                match restart(&self.level, player) {
                    Ok(()) => continue,
                    Err(err) => log::warn!("restart ignored for player {}: {err}", player.id),
                }
            }

            let mut recorder = self.events.recorder(self.frame, player.id);
            player.step(&command, world, &mut recorder);
        }

        self.frame += 1;
    }

    /// Position of every player, in `players` order.
    pub fn player_positions(&self) -> Vec<Vec3> {
        self.players.iter().map(Player::position).collect()
    }

    /// Get the delta time for this simulation.
    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }
}

/// Respawn a player at the spawn point they were assigned.
fn restart(level: &Level, player: &mut Player) -> Result<(), SpawnError> {
    let spawn = level
        .player_spawn(player.spawn_index)
        .ok_or_else(|| SpawnError::NoSpawnPoint {
            level: level.id.clone(),
        })?;

    player.respawn(spawn, &level.collision);
    player.restarts += 1;
    log::debug!("player {} restarted at {}", player.id, player.position());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_sim() -> (Simulation, EntityId) {
        let mut sim = Simulation::new(SimulationConfig::default(), Level::flat());
        let id = sim.add_player("Test").expect("flat level has a spawn");
        (sim, id)
    }

    fn restart_input() -> PlayerInput {
        let mut input = PlayerInput::default();
        input.actions.restart = true;
        input
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::test();
        assert_eq!(sim.frame, 0);
        assert!(sim.players.is_empty());
        assert!(sim.events.is_empty());
        assert!((sim.delta_time() - 1.0 / 64.0).abs() < 1.0e-9);
    }

    #[test]
    fn test_add_player() {
        let mut sim = Simulation::test();

        let id = sim.add_player("Player1").unwrap();
        assert!(id > 0);
        assert_eq!(sim.players.len(), 1);

        let player = sim.get_player(id).unwrap();
        assert_eq!(player.name, "Player1");
        assert!(player.is_grounded());

        let second = sim.add_player("Player2").unwrap();
        assert_eq!(sim.get_player(second).unwrap().spawn_index, 1);
    }

    #[test]
    fn test_add_player_without_spawn() {
        let mut sim = Simulation::new(SimulationConfig::default(), Level::new("empty", "Empty"));

        let result = sim.add_player("Nobody");
        assert_eq!(
            result,
            Err(SpawnError::NoSpawnPoint {
                level: "empty".to_string()
            })
        );
        assert!(sim.players.is_empty());
    }

    #[test]
    fn test_tick_advances_frame() {
        let (mut sim, _) = flat_sim();

        sim.tick(&[PlayerInput::default()]);
        assert_eq!(sim.frame, 1);

        sim.tick(&[PlayerInput::default()]);
        assert_eq!(sim.frame, 2);
    }

    #[test]
    fn test_movement_input() {
        let (mut sim, id) = flat_sim();

        let start_pos = sim.get_player(id).unwrap().position();

        for _ in 0..64 {
            sim.tick(&[PlayerInput::forward()]);
        }

        let end_pos = sim.get_player(id).unwrap().position();
        let distance = (end_pos - start_pos).length();

        assert!(distance > 1.0, "Player should have moved, distance={}", distance);
    }

    #[test]
    fn test_jump_is_logged() {
        let (mut sim, id) = flat_sim();

        for _ in 0..4 {
            sim.tick(&[PlayerInput::default()]);
        }

        let mut jump = PlayerInput::default();
        jump.actions.jump = true;
        sim.tick(&[jump]);

        for _ in 0..96 {
            sim.tick(&[PlayerInput::default()]);
        }

        let events: Vec<_> = sim.events.for_player(id).map(|e| e.event.clone()).collect();
        assert_eq!(events.first(), Some(&MovementEvent::Jumped(JumpType::Ground)));
        assert!(
            events.iter().any(|e| matches!(e, MovementEvent::Landed { .. })),
            "should land again: {events:?}"
        );
        assert_eq!(sim.events.entries()[0].frame, 4);

        let drained = sim.events.drain();
        assert!(!drained.is_empty());
        assert!(sim.events.is_empty());
    }

    #[test]
    fn test_restart_returns_to_spawn() {
        let (mut sim, id) = flat_sim();
        let spawn = sim.get_player(id).unwrap().position();

        for _ in 0..64 {
            sim.tick(&[PlayerInput::forward()]);
        }
        assert!(sim.get_player(id).unwrap().position().distance(spawn) > 50.0);

        sim.tick(&[restart_input()]);

        let player = sim.get_player(id).unwrap();
        assert!(player.position().distance(spawn) < 0.1, "back at {}", player.position());
        assert_eq!(player.state.velocity, Vec3::ZERO);
        assert_eq!(player.restarts, 1);

        // Holding restart does not restart again
        let mut held = PlayerInput::forward();
        held.actions.restart = true;
        for _ in 0..16 {
            sim.tick(&[held.clone()]);
        }
        let player = sim.get_player(id).unwrap();
        assert_eq!(player.restarts, 1);
        assert!(player.position().distance(spawn) > 1.0);
    }

    #[test]
    fn test_restart_without_spawn_is_ignored() {
        let (mut sim, id) = flat_sim();

        for _ in 0..32 {
            sim.tick(&[PlayerInput::forward()]);
        }
        sim.level.spawn_points.clear();
        let before = sim.get_player(id).unwrap().position();

        sim.tick(&[restart_input()]);

        let player = sim.get_player(id).unwrap();
        assert_eq!(player.restarts, 0);
        assert!(player.position().x > before.x, "keeps moving after the ignored restart");
    }

    #[test]
    fn test_restart_unknown_player() {
        let (mut sim, _) = flat_sim();
        assert_eq!(sim.restart_player(99), Err(SpawnError::UnknownPlayer(99)));
    }

    #[test]
    fn test_determinism() {
        // Run simulation twice with same inputs - should get same results
        let inputs: Vec<_> = (0..200)
            .map(|i| {
                let mut input = PlayerInput::default();
                input.movement.forward = i % 7 != 0;
                input.movement.left = i % 5 == 0;
                input.actions.jump = i % 24 < 2;
                input.actions.duck = (90..110).contains(&i);
                input.mouse_delta = ((i % 3) as f32 - 1.0, 0.0);
                input
            })
            .collect();

        let run = || {
            let mut sim = Simulation::test();
            sim.add_player("Test").unwrap();
            for input in &inputs {
                sim.tick(std::slice::from_ref(input));
            }
            sim
        };

        let sim1 = run();
        let sim2 = run();

        let pos1 = sim1.player_positions();
        let pos2 = sim2.player_positions();
        assert_eq!(pos1, pos2, "Simulations should be deterministic");
        assert_eq!(sim1.events.entries(), sim2.events.entries());
    }
}
