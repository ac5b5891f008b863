//! Fixed-tick timekeeping.
//!
//! Every "time since" value in movement is measured in whole ticks, so two
//! events stamped on the same tick are exactly zero seconds apart and replays
//! never drift.

use serde::{Deserialize, Serialize};

/// The simulation clock of one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickClock {
    /// Index of the tick currently being simulated.
    pub tick: u64,

    /// Length of a tick in seconds.
    pub delta: f32,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(1.0 / 64.0)
    }
}

impl TickClock {
    pub fn new(delta: f32) -> Self {
        Self { tick: 0, delta }
    }

    /// Begin the next tick.
    #[inline]
    pub fn advance(&mut self, delta: f32) {
        self.tick += 1;
        self.delta = delta;
    }

    /// Stamp for the current tick.
    #[inline]
    pub fn now(&self) -> TickStamp {
        TickStamp(Some(self.tick))
    }

    /// Whole ticks elapsed since `stamp`, saturating at `u64::MAX` for [`TickStamp::NEVER`].
    #[inline]
    pub fn ticks_since(&self, stamp: TickStamp) -> u64 {
        match stamp.0 {
            Some(tick) => self.tick.saturating_sub(tick),
            None => u64::MAX,
        }
    }

    /// Seconds elapsed since `stamp`. Infinite for [`TickStamp::NEVER`].
    #[inline]
    pub fn since(&self, stamp: TickStamp) -> f32 {
        match stamp.0 {
            Some(_) => self.ticks_since(stamp) as f32 * self.delta,
            None => f32::INFINITY,
        }
    }

    /// Whether `stamp` was taken during the current tick.
    #[inline]
    pub fn is_now(&self, stamp: TickStamp) -> bool {
        stamp.0 == Some(self.tick)
    }
}

/// The tick at which something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickStamp(Option<u64>);

impl TickStamp {
    /// Something that has not happened yet, infinitely long ago.
    pub const NEVER: Self = Self(None);

    #[inline]
    pub fn is_never(self) -> bool {
        self.0.is_none()
    }
}
