//! The built-in abilities.
//!
//! | Ability | Button  | Overrides while attached |
//! |---------|---------|--------------------------|
//! | Grapple | ability | air speed, air acceleration, gravity scale |

pub mod grapple;

pub use grapple::Grapple;
