//! PCM quantization dither.
//!
//! Only the dither RNG is genuinely process-lifetime state, so it gets an
//! explicit init call rather than living behind a `static`: `rand`'s
//! non-thread-local `SmallRng` lets the seed be threaded explicitly through
//! a `FileEditor`.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A dither source producing uniformly-distributed noise in `[-0.5, 0.5)`
/// LSBs, seeded explicitly rather than from thread-local entropy.
#[derive(Debug, Clone)]
pub struct DitherSource {
    rng: SmallRng,
}

impl DitherSource {
    /// Seed from the OS entropy source, for normal editor use.
    pub fn new() -> Self {
        DitherSource { rng: SmallRng::from_entropy() }
    }

    /// Seed deterministically, for reproducible tests.
    pub fn from_seed(seed: u64) -> Self {
        DitherSource { rng: SmallRng::seed_from_u64(seed) }
    }

    /// One dither sample in `[-0.5, 0.5)`.
    pub fn next_lsb(&mut self) -> f64 {
        self.rng.gen_range(-0.5..0.5)
    }
}

impl Default for DitherSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dither_stays_within_one_lsb() {
        let mut d = DitherSource::from_seed(42);
        for _ in 0..1000 {
            let v = d.next_lsb();
            assert!((-0.5..0.5).contains(&v));
        }
    }

    #[test]
    fn same_seed_is_reproducible() {
        let mut a = DitherSource::from_seed(7);
        let mut b = DitherSource::from_seed(7);
        for _ in 0..16 {
            assert_eq!(a.next_lsb(), b.next_lsb());
        }
    }
}
