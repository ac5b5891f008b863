//! Content and surface flags for collision filtering.
//!
//! Content flags decide what a sweep collides with. Surface flags carry
//! material properties that movement reports to collaborators (footsteps).

use serde::{Deserialize, Serialize};

/// Content flags describe what kind of volume a brush is.
///
/// Sweeps carry a mask of the contents they collide with, so the same world
/// can hold solid geometry, player-only clips and non-solid trigger zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentFlags(pub u32);

impl ContentFlags {
    /// Empty space.
    pub const EMPTY: Self = Self(0);

    /// Solid world geometry: walls, floors, ceilings.
    pub const SOLID: Self = Self(1 << 0);

    /// Blocks characters but nothing else.
    pub const PLAYER_CLIP: Self = Self(1 << 1);

    /// Solid for movement, transparent to hitscan.
    pub const PASS_BULLETS: Self = Self(1 << 2);

    /// Another character's hull.
    pub const PLAYER_BODY: Self = Self(1 << 3);

    /// Trigger volume (start/end zones, teleports). Never solid.
    pub const TRIGGER: Self = Self(1 << 4);

    /// Mask used by every character movement sweep.
    ///
    /// Other characters are not included: characters pass through each other.
    pub const MASK_PLAYER_MOVE: Self =
        Self(Self::SOLID.0 | Self::PLAYER_CLIP.0 | Self::PASS_BULLETS.0);

    /// Check if these flags contain every bit of `other`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Remove flags from this set.
    #[inline]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for ContentFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for ContentFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Surface flags describe the material of a brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SurfaceFlags(pub u32);

impl SurfaceFlags {
    /// No special properties.
    pub const NONE: Self = Self(0);

    /// Walking on this surface makes no footstep events.
    pub const NO_STEPS: Self = Self(1 << 0);

    pub const METAL: Self = Self(1 << 1);
    pub const WOOD: Self = Self(1 << 2);
    pub const GRAVEL: Self = Self(1 << 3);

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for SurfaceFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
