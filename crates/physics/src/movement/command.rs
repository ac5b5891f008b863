//! Per-tick input command.

use serde::{Deserialize, Serialize};

/// Input command from the player for a single tick.
///
/// This represents the player's intent: the movement wish, how the view
/// turned, and button state both held and pressed on this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerCommand {
    /// Forward/backward movement (-1.0 to 1.0).
    /// Positive = forward, negative = backward.
    pub forward_move: f32,

    /// Strafe left/right (-1.0 to 1.0).
    /// Positive = right, negative = left.
    pub right_move: f32,

    /// View angle delta this tick (radians).
    /// (pitch_delta, yaw_delta)
    pub view_delta: (f32, f32),

    /// Buttons down during this tick.
    pub held: CommandButtons,

    /// Buttons that went down on this tick.
    pub pressed: CommandButtons,
}

/// Button state flags for player commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandButtons(pub u16);

impl CommandButtons {
    pub const JUMP: u16 = 1 << 0;
    pub const DUCK: u16 = 1 << 1;

    /// Run (sprint) button.
    pub const SPRINT: u16 = 1 << 2;

    /// Ability button. Fires and releases the grapple.
    pub const ABILITY: u16 = 1 << 3;

    /// Respawn at the start of the course.
    pub const RESTART: u16 = 1 << 4;

    /// Digital movement keys. Only their presses matter to movement,
    /// the analog axes carry the held direction.
    pub const FORWARD: u16 = 1 << 5;
    pub const BACK: u16 = 1 << 6;
    pub const LEFT: u16 = 1 << 7;
    pub const RIGHT: u16 = 1 << 8;

    /// Any of the movement keys.
    pub const MOVEMENT: u16 = Self::FORWARD | Self::BACK | Self::LEFT | Self::RIGHT;

    /// Check if any of the given buttons are set.
    #[inline]
    pub fn contains(self, button: u16) -> bool {
        (self.0 & button) != 0
    }

    /// Press a button.
    #[inline]
    pub fn press(&mut self, button: u16) {
        self.0 |= button;
    }

    /// Release a button.
    #[inline]
    pub fn release(&mut self, button: u16) {
        self.0 &= !button;
    }

    /// Buttons set in `self` but not in `previous`.
    #[inline]
    pub fn newly_pressed(self, previous: Self) -> Self {
        Self(self.0 & !previous.0)
    }
}

impl PlayerCommand {
    #[inline]
    pub fn is_held(&self, button: u16) -> bool {
        self.held.contains(button)
    }

    #[inline]
    pub fn was_pressed(&self, button: u16) -> bool {
        self.pressed.contains(button)
    }

    /// Check if any movement input is active.
    #[inline]
    pub fn has_movement_input(&self) -> bool {
        self.forward_move.abs() > 0.01 || self.right_move.abs() > 0.01
    }

    /// Whether a movement key went down this tick.
    #[inline]
    pub fn pressed_movement_key(&self) -> bool {
        self.pressed.contains(CommandButtons::MOVEMENT)
    }

    /// Mark `button` held, and pressed if it was not held on the previous tick.
    pub fn with_button(mut self, button: u16, previously_held: bool) -> Self {
        self.held.press(button);
        if !previously_held {
            self.pressed.press(button);
        }
        self
    }
}
