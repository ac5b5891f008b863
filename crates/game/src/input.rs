//! Player input handling.
//!
//! This module converts raw input (keyboard, mouse, gamepad) into
//! commands for the physics system, detecting which buttons went down
//! on each tick.

use serde::{Deserialize, Serialize};
use vaultrun_physics::movement::{CommandButtons, PlayerCommand};

/// Raw player input for a single tick.
///
/// This is the input format received from the client input system.
/// It gets converted to [`PlayerCommand`] by an [`InputSampler`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Movement keys held.
    pub movement: MovementInput,

    /// Analog stick (right, forward), each -1.0 to 1.0. Replaces the
    /// movement keys when present.
    pub analog_move: Option<(f32, f32)>,

    /// Mouse delta this tick (pixels).
    pub mouse_delta: (f32, f32),

    /// Action buttons held.
    pub actions: ActionInput,
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Action button states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInput {
    pub jump: bool,
    pub duck: bool,
    pub sprint: bool,
    pub ability: bool,
    pub restart: bool,
}

impl PlayerInput {
    /// Input holding only the forward key.
    pub fn forward() -> Self {
        Self {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Check if any movement input is active.
    pub fn has_movement(&self) -> bool {
        match self.analog_move {
            Some((right, forward)) => right != 0.0 || forward != 0.0,
            None => {
                self.movement.forward
                    || self.movement.backward
                    || self.movement.left
                    || self.movement.right
            }
        }
    }

    /// Buttons held in this input, movement keys included.
    pub fn held_buttons(&self) -> CommandButtons {
        let mut buttons = CommandButtons::default();
        let pairs = [
            (self.actions.jump, CommandButtons::JUMP),
            (self.actions.duck, CommandButtons::DUCK),
            (self.actions.sprint, CommandButtons::SPRINT),
            (self.actions.ability, CommandButtons::ABILITY),
            (self.actions.restart, CommandButtons::RESTART),
        ];
        for (down, button) in pairs {
            if down {
                buttons.press(button);
            }
        }

        if self.analog_move.is_none() {
            let keys = [
                (self.movement.forward, CommandButtons::FORWARD),
                (self.movement.backward, CommandButtons::BACK),
                (self.movement.left, CommandButtons::LEFT),
                (self.movement.right, CommandButtons::RIGHT),
            ];
            for (down, button) in keys {
                if down {
                    buttons.press(button);
                }
            }
        }

        buttons
    }

    /// Movement axes (forward, right), with diagonals normalized.
    fn move_axes(&self) -> (f32, f32) {
        if let Some((right, forward)) = self.analog_move {
            let forward = forward.clamp(-1.0, 1.0);
            let right = right.clamp(-1.0, 1.0);
            let magnitude = (forward * forward + right * right).sqrt();
            if magnitude > 1.0 {
                return (forward / magnitude, right / magnitude);
            }
            return (forward, right);
        }

        let mut forward_move: f32 = 0.0;
        let mut right_move: f32 = 0.0;

        if self.movement.forward {
            forward_move += 1.0;
        }
        if self.movement.backward {
            forward_move -= 1.0;
        }
        if self.movement.right {
            right_move += 1.0;
        }
        if self.movement.left {
            right_move -= 1.0;
        }

        // Normalize diagonal movement
        let magnitude: f32 = (forward_move * forward_move + right_move * right_move).sqrt();
        if magnitude > 1.0 {
            forward_move /= magnitude;
            right_move /= magnitude;
        }

        (forward_move, right_move)
    }
}

/// Turns a stream of [`PlayerInput`] into [`PlayerCommand`]s, remembering
/// the previous tick's buttons so presses are reported exactly once.
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    previous: CommandButtons,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample one tick of input.
    ///
    /// # Arguments
    ///
    /// * `input` - Raw input for this tick
    /// * `mouse_sensitivity` - Mouse sensitivity multiplier
    pub fn sample(&mut self, input: &PlayerInput, mouse_sensitivity: f32) -> PlayerCommand {
        let (forward_move, right_move) = input.move_axes();

        // Mouse pixels to radians. Moving the mouse down looks down, which is positive pitch.
        let sensitivity_radians = mouse_sensitivity * 0.001;
        let view_delta = (
            input.mouse_delta.1 * sensitivity_radians,
            input.mouse_delta.0 * sensitivity_radians,
        );

        let held = input.held_buttons();
        let pressed = held.newly_pressed(self.previous);
        self.previous = held;

        PlayerCommand {
            forward_move,
            right_move,
            view_delta,
            held,
            pressed,
        }
    }
}
