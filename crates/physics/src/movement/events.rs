//! Movement events reported to collaborators after each tick.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::SurfaceFlags;

/// Which kind of jump happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumpType {
    Ground,
    Air,
    Wall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FootstepKind {
    Walk,
    Run,
    Wallrun,
}

/// Something that happened to the character during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MovementEvent {
    Jumped(JumpType),

    Landed {
        /// Vertical speed at touchdown (negative when falling).
        fall_speed: f32,
        /// Equivalent fall height in feet.
        fall_height: f32,
        hard: bool,
    },

    /// A wall jump shortly after touching the wall.
    FastWallJump {
        /// Horizontal speed after the jump minus the speed before touching the wall.
        speed_delta: f32,
        time_since_wall_touch: f32,
    },

    Footstep {
        kind: FootstepKind,
        quiet: bool,
        surface: SurfaceFlags,
    },

    /// The grapple hook stuck into geometry.
    GrappleAttached { anchor: Vec3 },

    /// An attached grapple let go.
    GrappleReleased,
}

impl MovementEvent {
    /// Deliver this event to the matching sink callback.
    pub fn dispatch(&self, sink: &mut dyn EventSink) {
        match *self {
            Self::Jumped(jump_type) => sink.on_jump(jump_type),
            Self::Landed {
                fall_speed,
                fall_height,
                hard,
            } => sink.on_landed(fall_speed, fall_height, hard),
            Self::FastWallJump {
                speed_delta,
                time_since_wall_touch,
            } => sink.on_fast_wall_jump(speed_delta, time_since_wall_touch),
            Self::Footstep {
                kind,
                quiet,
                surface,
            } => sink.on_footstep(kind, quiet, surface),
            Self::GrappleAttached { anchor } => sink.on_grapple_attached(anchor),
            Self::GrappleReleased => sink.on_grapple_released(),
        }
    }
}

/// Receives movement events. Every callback defaults to doing nothing.
pub trait EventSink {
    fn on_jump(&mut self, _jump_type: JumpType) {}

    fn on_landed(&mut self, _fall_speed: f32, _fall_height: f32, _hard: bool) {}

    fn on_fast_wall_jump(&mut self, _speed_delta: f32, _time_since_wall_touch: f32) {}

    fn on_footstep(&mut self, _kind: FootstepKind, _quiet: bool, _surface: SurfaceFlags) {}

    fn on_grapple_attached(&mut self, _anchor: Vec3) {}

    fn on_grapple_released(&mut self) {}
}

/// A sink that ignores everything.
impl EventSink for () {}

/// Collects events in order.
impl EventSink for Vec<MovementEvent> {
    fn on_jump(&mut self, jump_type: JumpType) {
        self.push(MovementEvent::Jumped(jump_type));
    }

    fn on_landed(&mut self, fall_speed: f32, fall_height: f32, hard: bool) {
        self.push(MovementEvent::Landed {
            fall_speed,
            fall_height,
            hard,
        });
    }

    fn on_fast_wall_jump(&mut self, speed_delta: f32, time_since_wall_touch: f32) {
        self.push(MovementEvent::FastWallJump {
            speed_delta,
            time_since_wall_touch,
        });
    }

    fn on_footstep(&mut self, kind: FootstepKind, quiet: bool, surface: SurfaceFlags) {
        self.push(MovementEvent::Footstep {
            kind,
            quiet,
            surface,
        });
    }

    fn on_grapple_attached(&mut self, anchor: Vec3) {
        self.push(MovementEvent::GrappleAttached { anchor });
    }

    fn on_grapple_released(&mut self) {
        self.push(MovementEvent::GrappleReleased);
    }
}
