//! The mechanic trait and per-mechanic bookkeeping.
//!
//! A mechanic is one self-contained movement behavior. Every tick the
//! scheduler asks each mechanic whether it wants to be active, tells it about
//! transitions, runs its update while active, and merges its tags and
//! overrides into the character state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::MechanicContext;
use super::state::MechanicTags;
use super::time::{TickClock, TickStamp};

/// Identifies a built-in mechanic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MechanicId {
    Crouch,
    Jump,
    AirMove,
    Walk,
    Slide,
    Wallrun,
    Sprint,
}

impl MechanicId {
    /// Bit used in [`super::state::ActiveMechanics`].
    #[inline]
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Crouch => "crouch",
            Self::Jump => "jump",
            Self::AirMove => "airmove",
            Self::Walk => "walk",
            Self::Slide => "slide",
            Self::Wallrun => "wallrun",
            Self::Sprint => "sprint",
        }
    }
}

impl fmt::Display for MechanicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Activation history the scheduler keeps for each mechanic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanicTimers {
    pub is_active: bool,

    /// Last activation or deactivation.
    pub active_changed: TickStamp,

    /// When the current (or most recent) activation began.
    pub start: TickStamp,

    /// Activation before the current one, during its transition callback.
    /// Afterwards equal to `start`.
    pub last_start: TickStamp,

    pub stop: TickStamp,
}

impl MechanicTimers {
    #[inline]
    pub fn since_active_changed(&self, clock: &TickClock) -> f32 {
        clock.since(self.active_changed)
    }

    #[inline]
    pub fn since_start(&self, clock: &TickClock) -> f32 {
        clock.since(self.start)
    }

    #[inline]
    pub fn since_last_start(&self, clock: &TickClock) -> f32 {
        clock.since(self.last_start)
    }

    #[inline]
    pub fn since_stop(&self, clock: &TickClock) -> f32 {
        clock.since(self.stop)
    }
}

/// A movement behavior run by the [`super::scheduler::Scheduler`].
///
/// `should_become_active` must not change anything. One-shot effects belong in
/// `on_active_changed`, bookkeeping that runs regardless of activity in
/// `simulate`, and the per-tick behavior in `on_active_update`.
pub trait Mechanic {
    fn id(&self) -> MechanicId;

    /// Lower runs first. Higher wins override conflicts.
    fn priority(&self) -> i32;

    fn should_become_active(&self, ctx: &MechanicContext<'_>, timers: &MechanicTimers) -> bool;

    /// Called once per transition, after `timers` reflects the new state.
    fn on_active_changed(
        &mut self,
        _before: bool,
        _after: bool,
        _ctx: &mut MechanicContext<'_>,
        _timers: &MechanicTimers,
    ) {
    }

    /// Runs every tick whether or not the mechanic is active.
    fn simulate(&mut self, _ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {}

    /// Runs every tick while active.
    fn on_active_update(&mut self, _ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {}

    fn tags(&self, _ctx: &MechanicContext<'_>) -> MechanicTags {
        MechanicTags::NONE
    }

    fn speed(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        None
    }

    fn acceleration(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        None
    }

    fn hull_height(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        None
    }

    fn eye_height(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mechanic_bits_are_distinct() {
        let ids = [
            MechanicId::Crouch,
            MechanicId::Jump,
            MechanicId::AirMove,
            MechanicId::Walk,
            MechanicId::Slide,
            MechanicId::Wallrun,
            MechanicId::Sprint,
        ];

        let mut seen = 0u8;
        for id in ids {
            assert_eq!(seen & id.bit(), 0, "{id} shares a bit");
            seen |= id.bit();
        }
    }

    #[test]
    fn test_timers_default_to_never() {
        let clock = TickClock::default();
        let timers = MechanicTimers::default();

        assert!(!timers.is_active);
        assert_eq!(timers.since_start(&clock), f32::INFINITY);
        assert_eq!(timers.since_stop(&clock), f32::INFINITY);
    }
}
