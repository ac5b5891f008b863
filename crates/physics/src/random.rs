//! Seeded random numbers for recovery paths.
//!
//! Probes that need "random" offsets still produce identical results for
//! identical inputs: the generator is seeded from the position being fixed.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Generator seeded from the bit pattern of a position.
pub fn from_position(position: Vec3) -> SmallRng {
    let seed = u64::from(position.x.to_bits())
        ^ u64::from(position.y.to_bits()).rotate_left(21)
        ^ u64::from(position.z.to_bits()).rotate_left(42);
    SmallRng::seed_from_u64(seed)
}

/// Vector helpers on top of [`Rng`].
pub trait RngVecExt {
    /// A point inside the unit cube centered on the origin.
    fn unit_cube(&mut self) -> Vec3;
}

impl<R: Rng + ?Sized> RngVecExt for R {
    fn unit_cube(&mut self) -> Vec3 {
        Vec3::new(
            self.gen_range(-1.0..=1.0),
            self.gen_range(-1.0..=1.0),
            self.gen_range(-1.0..=1.0),
        )
    }
}
