//! Movement configuration constants.
//!
//! All movement parameters are grouped here for easy tuning. Distances are in
//! world units (inches), speeds in units/second and times in seconds unless a
//! field says otherwise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while resolving movement configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown movement preset '{0}' (expected regular, faster or debug)")]
    UnknownPreset(String),
}

/// Named movement presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementPreset {
    #[default]
    Regular,
    Faster,
    /// Wall-running without time or gravity limits, for testing wall movement.
    Debug,
}

impl MovementPreset {
    /// Build the configuration for this preset.
    pub fn config(self) -> MovementConfig {
        match self {
            Self::Regular => MovementConfig::regular(),
            Self::Faster => MovementConfig::faster(),
            Self::Debug => MovementConfig::debug(),
        }
    }
}

impl FromStr for MovementPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "faster" => Ok(Self::Faster),
            "debug" => Ok(Self::Debug),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for MovementPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Regular => "regular",
            Self::Faster => "faster",
            Self::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Configuration for character movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    // ========================================================================
    // Hull and View
    // ========================================================================
    /// Half-width of the hull box.
    pub hull_radius: f32,
    pub hull_height_standing: f32,
    pub hull_height_crouching: f32,

    /// Eye height above the feet when standing.
    pub view_height_standing: f32,
    pub view_height_crouching: f32,

    /// Maximum look-up pitch (degrees).
    pub pitch_max_up: f32,

    /// Maximum look-down pitch (degrees).
    pub pitch_max_down: f32,

    // ========================================================================
    // Controller
    // ========================================================================
    /// Gravity acceleration (units/second²).
    pub gravity: f32,

    /// Scale applied to gravity while integrating. Jump impulses use unscaled gravity.
    pub gravity_scale: f32,

    /// Tallest ledge the character steps up without jumping.
    pub step_height_max: f32,

    /// Steps smaller than this do not add a visual smoothing offset.
    pub step_height_min: f32,

    /// Steepest surface that still counts as ground (degrees from up).
    pub ground_angle: f32,

    /// Vertical speed above which the character can never be grounded.
    pub max_non_jump_velocity: f32,

    // ========================================================================
    // Movement
    // ========================================================================
    /// Ground acceleration (units/second²).
    pub acceleration: f32,
    pub walk_speed: f32,
    pub crouch_speed: f32,
    pub sprint_speed: f32,
    pub air_speed: f32,
    pub air_acceleration: f32,

    /// Minimum acceleration budget in the air even above `air_speed`.
    pub extra_air_acceleration: f32,

    /// Smallest forward component of the movement input that still sprints.
    pub sprint_max_angle_dot: f32,

    // ========================================================================
    // Duck
    // ========================================================================
    /// Duck fraction per second when ducking.
    pub duck_speed: f32,

    /// Duck fraction per second when unducking (and ducking into a slide).
    pub unduck_speed: f32,

    // ========================================================================
    // Jump
    // ========================================================================
    pub can_jump_while_unducking: bool,
    pub jump_height: f32,

    /// Coyote time after leaving the ground or falling away from a wall.
    pub jump_grace_period: f32,

    /// How long a jump press stays buffered.
    pub jump_buffer_time: f32,

    /// Replaces `jump_buffer_time` with a whole number of ticks when set.
    pub jump_buffer_ticks: Option<u32>,

    pub jump_keyboard_grace_period_min: f32,
    pub jump_keyboard_grace_period_max: f32,

    /// Largest velocity change from keyboard grace, as a fraction of `sprint_speed`.
    pub jump_keyboard_grace_max: f32,
    pub jump_keyboard_grace_strength: f32,

    // ========================================================================
    // Air Jump
    // ========================================================================
    pub air_jump_height: f32,
    pub air_jump_horizontal_speed: f32,

    /// Smallest upward boost of an air jump, as a fraction of the full jump speed.
    pub air_jump_min_height_fraction: f32,
    pub air_jump_max_jumps: u32,

    // ========================================================================
    // Slide
    // ========================================================================
    pub slide_boost_cooldown: f32,

    /// Fixed deceleration while sliding (units/second²).
    pub slide_decel: f32,

    /// Fraction of velocity kept per second while sliding.
    pub slide_velocity_decay: f32,
    pub slide_speed_boost: f32,

    /// Boosts never take horizontal speed above this.
    pub slide_speed_boost_cap: f32,
    pub slide_max_angle_dot: f32,
    pub slide_required_start_speed: f32,
    pub slide_jump_height: f32,

    /// Above this speed, standing up mid-slide adds `slide_force_slide_unduck_decel`.
    pub slide_force_slide_speed: f32,
    pub slide_force_slide_unduck_decel: f32,
    pub slide_end_speed: f32,

    /// A slide ends after being airborne this long.
    pub slide_max_air_time: f32,

    // ========================================================================
    // Skip
    // ========================================================================
    /// Jumping within this long after landing is a skip.
    pub skip_time: f32,
    pub skip_speed_retain: f32,
    pub skip_speed_reduce: f32,
    pub skip_jump_height_fraction: f32,

    // ========================================================================
    // Wallrun
    // ========================================================================
    pub wallrun_enabled: bool,
    pub wallrun_time_limit: f32,
    pub wallrun_gravity_ramp_up_time: f32,
    pub wallrun_up_wall_boost: f32,
    pub wallrun_jump_outward_speed: f32,
    pub wallrun_jump_up_speed: f32,
    pub wallrun_jump_input_dir_speed: f32,
    pub wallrun_fall_away_speed: f32,
    pub wallrun_max_speed_horizontal: f32,
    pub wallrun_max_speed_backwards: f32,
    pub wallrun_max_speed_vertical: f32,
    pub wallrun_acceleration_horizontal: f32,
    pub wallrun_acceleration_vertical: f32,
    pub wallrun_avoid_top_wall_decel: f32,
    pub wallrun_friction: f32,
    pub wallrun_slip_start_time: f32,
    pub wallrun_slip_duration: f32,
    pub wallrun_no_input_slip_frac: f32,
    pub wallrun_push_away_fall_off_time: f32,
    pub wallrun_upward_auto_push: f32,

    /// Walls whose normals dot above this count as the same wall.
    pub wallrun_same_wall_dot: f32,

    /// How much higher than the last start a run on the same wall may begin.
    pub wallrun_same_wall_height: f32,

    /// Distance the feet probe reaches toward the wall.
    pub wallrun_allowed_wall_dist: f32,

    /// Below this cosine between current and target normal, the run does not snap to the wall.
    pub wallrun_angle_change_min_cos: f32,

    /// How fast the wall normal turns toward a new target (radians/second).
    pub wallrun_rotate_max_rate: f32,

    /// Look-ahead used to predict an upcoming wallrun.
    pub wallrun_tilt_predict_time: f32,

    // ========================================================================
    // Grapple
    // ========================================================================
    /// Farthest the hook flies before coming back.
    pub grapple_length: f32,
    pub grapple_shoot_speed: f32,
    pub grapple_retract_speed: f32,

    /// Downward drift of a hook coming back after a miss.
    pub grapple_retract_fall_speed: f32,

    /// The rope bends around at most this many corners before letting go.
    pub grapple_max_points: u32,

    /// A second press this soon after firing does not release the hook.
    pub grapple_detach_debounce: f32,

    /// Acceleration toward the anchor while attached (units/second²).
    pub grapple_pull_acceleration: f32,

    /// Speed toward the anchor the pull never exceeds.
    pub grapple_pull_speed: f32,

    /// Upward speed given when the pull lifts the character off the ground.
    pub grapple_ground_lift_speed: f32,

    /// The hook lets go when the eyes come this close to the anchor.
    pub grapple_release_distance: f32,

    /// Air speed and acceleration while attached.
    pub grapple_air_speed: f32,
    pub grapple_air_acceleration: f32,
    pub grapple_gravity_scale: f32,

    // ========================================================================
    // Misc
    // ========================================================================
    /// Step smoothing offset decay (units/second).
    pub step_smoothing_offset_correct_speed: f32,

    /// Fall height (feet) at which a landing counts as hard.
    pub hard_fall_dist: f32,

    // ========================================================================
    // Footsteps
    // ========================================================================
    pub footstep_walk_interval: f32,
    pub footstep_sprint_interval: f32,
    pub footstep_duck_interval_add: f32,
    pub footstep_duck_walk_speed: f32,
    pub footstep_duck_run_speed: f32,
    pub footstep_normal_walk_speed: f32,
    pub footstep_normal_run_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self::regular()
    }
}

impl MovementConfig {
    /// The standard tuning.
    pub fn regular() -> Self {
        Self {
            hull_radius: 16.0,
            hull_height_standing: 72.0,
            hull_height_crouching: 47.0,
            view_height_standing: 60.0,
            view_height_crouching: 38.0,
            pitch_max_up: 85.0,
            pitch_max_down: 89.0,

            gravity: 750.0,
            gravity_scale: 0.75,
            step_height_max: 18.0,
            step_height_min: 4.0,
            ground_angle: 46.0,
            max_non_jump_velocity: 140.0,

            acceleration: 2500.0,
            walk_speed: 162.5,
            crouch_speed: 80.0,
            sprint_speed: 243.0,
            air_speed: 60.0,
            air_acceleration: 500.0,
            extra_air_acceleration: 2.0,
            sprint_max_angle_dot: 0.6,

            duck_speed: 2.0,
            unduck_speed: 5.0,

            can_jump_while_unducking: true,
            jump_height: 60.0,
            jump_grace_period: 0.2,
            jump_buffer_time: 1.0 / 128.0,
            jump_buffer_ticks: None,
            jump_keyboard_grace_period_min: 0.2,
            jump_keyboard_grace_period_max: 0.5,
            jump_keyboard_grace_max: 0.7,
            jump_keyboard_grace_strength: 0.7,

            air_jump_height: 60.0,
            air_jump_horizontal_speed: 180.0,
            air_jump_min_height_fraction: 0.25,
            air_jump_max_jumps: 1,

            slide_boost_cooldown: 2.0,
            slide_decel: 50.0,
            slide_velocity_decay: 0.7,
            slide_speed_boost: 150.0,
            slide_speed_boost_cap: 400.0,
            slide_max_angle_dot: 0.6,
            slide_required_start_speed: 200.0,
            slide_jump_height: 50.0,
            slide_force_slide_speed: 350.0,
            slide_force_slide_unduck_decel: 350.0,
            slide_end_speed: 125.0,
            slide_max_air_time: 1.0,

            skip_time: 0.1,
            skip_speed_retain: 450.0,
            skip_speed_reduce: 12.0,
            skip_jump_height_fraction: 0.75,

            wallrun_enabled: true,
            wallrun_time_limit: 1.75,
            wallrun_gravity_ramp_up_time: 1.0,
            wallrun_up_wall_boost: 250.0,
            wallrun_jump_outward_speed: 205.0,
            wallrun_jump_up_speed: 230.0,
            wallrun_jump_input_dir_speed: 75.0,
            wallrun_fall_away_speed: 70.0,
            wallrun_max_speed_horizontal: 340.0,
            wallrun_max_speed_backwards: 50.0,
            wallrun_max_speed_vertical: 225.0,
            wallrun_acceleration_horizontal: 1400.0,
            wallrun_acceleration_vertical: 360.0,
            wallrun_avoid_top_wall_decel: 3000.0,
            wallrun_friction: 4.0,
            wallrun_slip_start_time: 2.0,
            wallrun_slip_duration: 1.0,
            wallrun_no_input_slip_frac: 0.7,
            wallrun_push_away_fall_off_time: 0.05,
            wallrun_upward_auto_push: 0.65,
            wallrun_same_wall_dot: 0.9,
            wallrun_same_wall_height: 0.0,
            wallrun_allowed_wall_dist: 13.0,
            wallrun_angle_change_min_cos: 0.8,
            wallrun_rotate_max_rate: 3.0,
            wallrun_tilt_predict_time: 0.25,

            grapple_length: 1000.0,
            grapple_shoot_speed: 3000.0,
            grapple_retract_speed: 2500.0,
            grapple_retract_fall_speed: 200.0,
            grapple_max_points: 8,
            grapple_detach_debounce: 0.2,
            grapple_pull_acceleration: 1500.0,
            grapple_pull_speed: 700.0,
            grapple_ground_lift_speed: 200.0,
            grapple_release_distance: 48.0,
            grapple_air_speed: 120.0,
            grapple_air_acceleration: 800.0,
            grapple_gravity_scale: 0.5,

            step_smoothing_offset_correct_speed: 80.0,
            hard_fall_dist: 20.0,

            footstep_walk_interval: 0.4,
            footstep_sprint_interval: 0.3,
            footstep_duck_interval_add: 0.1,
            footstep_duck_walk_speed: 80.0,
            footstep_duck_run_speed: 120.0,
            footstep_normal_walk_speed: 30.0,
            footstep_normal_run_speed: 220.0,
        }
    }

    /// Quicker runs and longer wall contact.
    pub fn faster() -> Self {
        Self {
            gravity_scale: 0.8,
            walk_speed: 173.5,
            sprint_speed: 260.0,
            wallrun_jump_input_dir_speed: 80.0,
            wallrun_max_speed_horizontal: 420.0,
            wallrun_acceleration_horizontal: 1500.0,
            wallrun_gravity_ramp_up_time: 0.7,
            wallrun_slip_start_time: 1.5,
            ..Self::regular()
        }
    }

    /// Effectively unlimited wall-running.
    pub fn debug() -> Self {
        Self {
            wallrun_time_limit: 9999.0,
            wallrun_gravity_ramp_up_time: 9999.0,
            wallrun_slip_start_time: 9999.0,
            wallrun_push_away_fall_off_time: 9999.0,
            wallrun_upward_auto_push: 0.0,
            wallrun_no_input_slip_frac: 0.0,
            ..Self::regular()
        }
    }

    /// Gravity applied while integrating (units/second², positive down).
    #[inline]
    pub fn player_gravity(&self) -> f32 {
        self.gravity * self.gravity_scale
    }

    /// Ticks a buffered jump press survives after the tick it was pressed on.
    ///
    /// `jump_buffer_time` is rounded up to whole ticks and never covers less
    /// than one.
    pub fn jump_buffer_window_ticks(&self, delta: f32) -> u64 {
        match self.jump_buffer_ticks {
            Some(ticks) => u64::from(ticks),
            None if delta > 0.0 => ((self.jump_buffer_time / delta - 1.0e-3).ceil() as u64).max(1),
            None => 1,
        }
    }

    /// Jump buffer window in seconds for a tick of length `delta`.
    pub fn jump_buffer_window(&self, delta: f32) -> f32 {
        self.jump_buffer_window_ticks(delta) as f32 * delta
    }

    /// Ground angle in radians.
    #[inline]
    pub fn ground_angle_radians(&self) -> f32 {
        self.ground_angle.to_radians()
    }
}
