//! Character state shared by the controller and the mechanics.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::SurfaceFlags;

use super::command::PlayerCommand;
use super::config::MovementConfig;
use super::mechanic::MechanicId;
use super::time::{TickClock, TickStamp};

/// Tags contributed by active mechanics.
///
/// Rebuilt at the end of every tick as the union of the active mechanics'
/// tags, and read by predicates and collaborators during the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MechanicTags(pub u16);

impl MechanicTags {
    pub const NONE: Self = Self(0);
    pub const WALK: Self = Self(1 << 0);
    pub const AIRMOVE: Self = Self(1 << 1);

    /// A ground jump happened this tick.
    pub const JUMP: Self = Self(1 << 2);

    /// An air jump happened this tick.
    pub const AIRJUMP: Self = Self(1 << 3);

    /// A wall jump happened this tick.
    pub const WALLJUMP: Self = Self(1 << 4);
    pub const SLIDE: Self = Self(1 << 5);
    pub const CROUCH: Self = Self(1 << 6);
    pub const SPRINT: Self = Self(1 << 7);
    pub const WALLRUN: Self = Self(1 << 8);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::WALK, "walk"),
        (Self::AIRMOVE, "airmove"),
        (Self::JUMP, "jump"),
        (Self::AIRJUMP, "airjump"),
        (Self::WALLJUMP, "walljump"),
        (Self::SLIDE, "slide"),
        (Self::CROUCH, "crouch"),
        (Self::SPRINT, "sprint"),
        (Self::WALLRUN, "wallrun"),
    ];

    /// Check if every tag in `other` is present.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any tag in `other` is present.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Tag names in a fixed order, for logs and collaborators.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(tag, _)| self.contains(*tag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for MechanicTags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which mechanics are active. Only the scheduler writes this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMechanics(u8);

impl ActiveMechanics {
    /// One bit per [`MechanicId::bit`].
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn contains(self, id: MechanicId) -> bool {
        (self.0 & id.bit()) != 0
    }

    #[inline]
    pub(crate) fn set(&mut self, id: MechanicId, active: bool) {
        if active {
            self.0 |= id.bit();
        } else {
            self.0 &= !id.bit();
        }
    }
}

/// Overrides merged from the active mechanics.
///
/// Recomputed from scratch every tick. For each field the highest-priority
/// active mechanic that supplies a value wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanicOverrides {
    pub speed: Option<f32>,
    pub acceleration: Option<f32>,
    pub hull_height: Option<f32>,
    pub eye_height: Option<f32>,
}

/// Overrides supplied by the active abilities.
///
/// Air movement prefers these to the configured air speed and acceleration,
/// and integration prefers the gravity scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityOverrides {
    pub speed: Option<f32>,
    pub acceleration: Option<f32>,
    pub gravity_scale: Option<f32>,
}

/// Where the grapple hook is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrapplePhase {
    #[default]
    Idle,
    /// Flying toward `target`.
    Shooting,
    /// Stuck in geometry and pulling.
    Attached,
    /// Coming back along the rope.
    Retracting,
}

/// The grapple hook and its rope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrappleState {
    pub phase: GrapplePhase,

    /// Rope points. The first is the hook, the last is the one the eyes can see.
    pub points: Vec<Vec3>,

    /// Where a flying hook is headed.
    pub target: Vec3,
}

impl GrappleState {
    #[inline]
    pub fn hook(&self) -> Option<Vec3> {
        self.points.first().copied()
    }

    /// The point the pull heads for: the rope corner nearest the eyes.
    #[inline]
    pub fn pull_point(&self) -> Option<Vec3> {
        self.points.last().copied()
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.phase == GrapplePhase::Attached
    }
}

/// Jump buffering and jump history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JumpState {
    pub air_jumps_remaining: u32,

    /// A press is waiting to be consumed.
    pub buffered: bool,
    pub buffered_at: TickStamp,

    pub last_ground_jump: TickStamp,
    pub last_air_jump: TickStamp,
    pub last_wall_jump: TickStamp,
}

/// Slide boost bookkeeping and the data cosmetic layers read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideState {
    /// The current slide started with a speed boost.
    pub used_boost: bool,

    /// Total speed when the current slide started.
    pub start_speed: f32,

    /// When the slide mechanic last became active.
    pub last_start: TickStamp,

    /// Horizontal direction of the last boost, for camera tilt.
    pub tilt_axis: Vec3,

    /// 1 while a slide widens the field of view, 0 otherwise.
    pub fov_target: f32,
}

/// Wall-run state.
///
/// The raw wall normals are crate-private: read them through
/// [`CharacterState::wall_normal`], which hides them while grounded or
/// when wall-running is disabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WallrunState {
    pub(crate) wall_normal: Option<Vec3>,
    pub(crate) target_wall_normal: Option<Vec3>,

    /// The most recent wall normal, kept after leaving the wall.
    pub last_wall_normal: Vec3,

    /// Where the current chain of wallruns started. Cleared on landing.
    pub last_start_pos: Option<Vec3>,

    /// Jumped since the last landing, so the next run gets the up boost.
    pub has_boost: bool,

    /// The current run repeats a wall or began without a jump.
    pub weak: bool,

    /// Last tick the input was not pushing away from the wall.
    pub not_pushing_away: TickStamp,
    pub fell_away: TickStamp,
    pub touched_wall: TickStamp,

    /// Horizontal speed just before the last wall touch.
    pub pre_touch_speed: f32,

    /// Wall we expect to run on shortly, for cosmetic tilt.
    pub predicted_wall_normal: Option<Vec3>,
}

impl WallrunState {
    /// Set the current normal. A new normal is also remembered as the last one.
    pub(crate) fn set_wall_normal(&mut self, normal: Option<Vec3>) {
        if let Some(normal) = normal {
            self.last_wall_normal = normal;
        }
        self.wall_normal = normal;
    }

    pub(crate) fn clear(&mut self) {
        self.set_wall_normal(None);
        self.target_wall_normal = None;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrouchState {
    /// Something is above us, so the crouch cannot be released.
    pub force_duck: bool,
}

/// Complete movement state for one character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterState {
    /// Position in world space (bottom-center of the hull).
    pub position: Vec3,

    /// Velocity in world space (units/second).
    pub velocity: Vec3,

    /// Eye angles in radians: (pitch, yaw, roll). Positive pitch looks down.
    pub eye_angles: Vec3,

    pub clock: TickClock,

    /// Entity we stand on ([`crate::collision::WORLD_ENTITY`] for static geometry).
    pub ground_entity: Option<i32>,
    pub last_ground_entity: Option<i32>,
    pub ground_normal: Vec3,
    pub ground_surface: SurfaceFlags,
    pub last_on_ground: TickStamp,
    pub last_landing: TickStamp,

    pub hull_height: f32,
    pub eye_height: f32,

    /// Crouch amount, 0 standing to 1 fully ducked.
    pub duck_fraction: f32,

    /// Visual offset added by step moves, decaying back to zero.
    pub step_smoothing_offset: Vec3,

    /// Velocity at the end of the previous tick.
    pub last_velocity: Vec3,

    /// Vertical speed when last landing or touching a wall.
    pub fall_speed: f32,

    /// Seconds until the next footstep may play.
    pub footstep_cooldown: f32,

    pub tags: MechanicTags,
    pub active: ActiveMechanics,
    pub overrides: MechanicOverrides,
    pub ability_overrides: AbilityOverrides,

    pub jump: JumpState,
    pub slide: SlideState,
    pub wallrun: WallrunState,
    pub crouch: CrouchState,
    pub grapple: GrappleState,
}

impl CharacterState {
    /// Create a standing, airborne character at the given position.
    pub fn new(position: Vec3, config: &MovementConfig) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            eye_angles: Vec3::ZERO,
            clock: TickClock::default(),
            ground_entity: None,
            last_ground_entity: None,
            ground_normal: Vec3::Y,
            ground_surface: SurfaceFlags::NONE,
            last_on_ground: TickStamp::NEVER,
            last_landing: TickStamp::NEVER,
            hull_height: config.hull_height_standing,
            eye_height: config.view_height_standing,
            duck_fraction: 0.0,
            step_smoothing_offset: Vec3::ZERO,
            last_velocity: Vec3::ZERO,
            fall_speed: 0.0,
            footstep_cooldown: 0.0,
            tags: MechanicTags::NONE,
            active: ActiveMechanics::default(),
            overrides: MechanicOverrides::default(),
            ability_overrides: AbilityOverrides::default(),
            jump: JumpState {
                air_jumps_remaining: config.air_jump_max_jumps,
                ..Default::default()
            },
            slide: SlideState::default(),
            wallrun: WallrunState::default(),
            crouch: CrouchState::default(),
            grapple: GrappleState::default(),
        }
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.ground_entity.is_some()
    }

    #[inline]
    pub fn has_tag(&self, tag: MechanicTags) -> bool {
        self.tags.contains(tag)
    }

    #[inline]
    pub fn is_active(&self, id: MechanicId) -> bool {
        self.active.contains(id)
    }

    /// Velocity with the vertical component zeroed.
    #[inline]
    pub fn horizontal_velocity(&self) -> Vec3 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z)
    }

    /// Current wall normal. Always `None` while grounded or with wall-running disabled.
    pub fn wall_normal(&self, config: &MovementConfig) -> Option<Vec3> {
        if self.is_grounded() || !config.wallrun_enabled {
            return None;
        }
        self.wallrun.wall_normal
    }

    /// Wall normal the current one is turning toward, under the same rules as [`Self::wall_normal`].
    pub fn target_wall_normal(&self, config: &MovementConfig) -> Option<Vec3> {
        if self.is_grounded() || !config.wallrun_enabled {
            return None;
        }
        self.wallrun.target_wall_normal
    }

    /// Fall height in feet for the last recorded fall speed.
    pub fn fall_height(&self, gravity: f32) -> f32 {
        let fall_speed = self.fall_speed;
        fall_speed * fall_speed / (2.0 * gravity) / 12.0 * (-fall_speed).signum()
    }

    /// Get the eye position (for camera placement).
    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::Y * self.eye_height + self.step_smoothing_offset
    }

    /// Horizontal forward direction from the eye yaw.
    pub fn forward_direction(&self) -> Vec3 {
        yaw_forward(self.eye_angles.y)
    }

    /// Horizontal right direction from the eye yaw.
    pub fn right_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.eye_angles.y.sin_cos();
        Vec3::new(-sin_yaw, 0.0, cos_yaw)
    }

    /// Full view direction including pitch.
    pub fn look_direction(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.eye_angles.x.sin_cos();
        let (sin_yaw, cos_yaw) = self.eye_angles.y.sin_cos();

        Vec3::new(cos_pitch * cos_yaw, -sin_pitch, cos_pitch * sin_yaw)
    }

    /// World-space movement wish direction with pitch ignored. Zero without input.
    pub fn wish_dir(&self, cmd: &PlayerCommand) -> Vec3 {
        (self.forward_direction() * cmd.forward_move + self.right_direction() * cmd.right_move)
            .normalize_or_zero()
    }
}

/// Horizontal unit vector for a yaw angle.
#[inline]
pub fn yaw_forward(yaw: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    Vec3::new(cos_yaw, 0.0, sin_yaw)
}

/// Yaw angle of a direction's horizontal part.
#[inline]
pub fn yaw_of(direction: Vec3) -> f32 {
    direction.z.atan2(direction.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_tags() {
        let mut tags = MechanicTags::WALK | MechanicTags::SPRINT;
        assert!(tags.contains(MechanicTags::WALK));
        assert!(!tags.contains(MechanicTags::WALK | MechanicTags::SLIDE));
        assert!(tags.intersects(MechanicTags::WALK | MechanicTags::SLIDE));

        tags.insert(MechanicTags::CROUCH);
        assert_eq!(tags.names(), vec!["walk", "crouch", "sprint"]);
        assert!(MechanicTags::NONE.is_empty());
    }

    #[test]
    fn test_active_mechanics() {
        let mut active = ActiveMechanics::default();
        active.set(MechanicId::Slide, true);
        assert!(active.contains(MechanicId::Slide));
        assert!(!active.contains(MechanicId::Walk));

        active.set(MechanicId::Slide, false);
        assert_eq!(active, ActiveMechanics::default());
        assert!(active.is_empty());

        active.set(MechanicId::Walk, true);
        active.set(MechanicId::Sprint, true);
        assert_eq!(active.bits(), MechanicId::Walk.bit() | MechanicId::Sprint.bit());
    }

    #[test]
    fn test_directions() {
        let config = MovementConfig::default();
        let mut state = CharacterState::new(Vec3::ZERO, &config);

        state.eye_angles.y = 0.0;
        assert!((state.forward_direction() - Vec3::X).length() < 0.001);
        assert!((state.right_direction() - Vec3::Z).length() < 0.001);

        state.eye_angles.y = PI / 2.0;
        assert!((state.forward_direction() - Vec3::Z).length() < 0.001);
        assert!((yaw_of(state.forward_direction()) - PI / 2.0).abs() < 0.001);
    }

    #[test]
    fn test_wish_dir_ignores_pitch() {
        let config = MovementConfig::default();
        let mut state = CharacterState::new(Vec3::ZERO, &config);
        state.eye_angles = Vec3::new(1.2, 0.0, 0.0);

        let cmd = PlayerCommand {
            forward_move: 1.0,
            right_move: 1.0,
            ..Default::default()
        };

        let wish = state.wish_dir(&cmd);
        assert!(wish.y.abs() < 0.001, "wish direction stays horizontal");
        assert!((wish.length() - 1.0).abs() < 0.001);
        assert_eq!(state.wish_dir(&PlayerCommand::default()), Vec3::ZERO);
    }

    #[test]
    fn test_wall_normal_hidden_while_grounded() {
        let mut config = MovementConfig::default();
        let mut state = CharacterState::new(Vec3::ZERO, &config);
        state.wallrun.set_wall_normal(Some(Vec3::X));

        assert_eq!(state.wall_normal(&config), Some(Vec3::X));
        assert_eq!(state.wallrun.last_wall_normal, Vec3::X);

        state.ground_entity = Some(-1);
        assert_eq!(state.wall_normal(&config), None);

        state.ground_entity = None;
        config.wallrun_enabled = false;
        assert_eq!(state.wall_normal(&config), None);
    }

    #[test]
    fn test_fall_height() {
        let config = MovementConfig::default();
        let mut state = CharacterState::new(Vec3::ZERO, &config);

        state.fall_speed = -600.0;
        let height = state.fall_height(config.gravity);
        assert!((height - 600.0 * 600.0 / 1500.0 / 12.0).abs() < 0.001);

        state.fall_speed = 100.0;
        assert!(state.fall_height(config.gravity) < 0.0, "rising is a negative fall");
    }
}
