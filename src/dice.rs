//! The die itself.

use rand::Rng;

/// Number of faces on the die.
pub const FACES: u8 = 6;

/// Roll the die once. Always in `1..=FACES`.
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=FACES)
}
