//! Randomness seam consumed by the wave generator.

use rand::Rng;

/// Uniform random source driving strategy picks, mutations and adaptation gates.
///
/// Every [`rand::Rng`] implements this trait, so production code hands the
/// generator a seeded generator such as `ChaCha8Rng` while tests can script
/// exact draws.
pub trait WaveRng {
    /// Draws a value uniformly from `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Draws an index uniformly from `0..len`. Callers never pass zero.
    fn choose_index(&mut self, len: usize) -> usize;
}

impl<R: Rng> WaveRng for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "choose_index requires a non-empty range");
        self.gen_range(0..len)
    }
}
