//! Randomness behind a single seedable seam
//!
//! Every random decision in the engine (symbol draws, pig values, hammer
//! roaming) goes through [`RandomSource`], so tests can swap the production
//! ChaCha stream for a fixed script.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Source of uniform randomness
pub trait RandomSource {
    /// Uniform value in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick_index on empty range");
        ((self.next_unit() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        (**self).pick_index(len)
    }
}

/// Production random source (ChaCha8)
#[derive(Debug, Clone)]
pub struct SlotRng {
    inner: ChaCha8Rng,
}

impl SlotRng {
    /// Create with optional seed; `None` seeds from the OS
    pub fn new(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self { inner }
    }

    /// Deterministic stream for reproducible sessions
    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }
}

impl Default for SlotRng {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RandomSource for SlotRng {
    fn next_unit(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.inner.random_range(0..len)
    }
}

/// Replays a fixed sequence of unit values, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    /// Values are clamped into `[0, 1)`
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// Always returns the same value
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }

    /// Number of values consumed so far
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRng {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_repeatable() {
        let mut a = SlotRng::seeded(42);
        let mut b = SlotRng::seeded(42);
        for _ in 0..32 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn test_pick_index_in_range() {
        let mut rng = SlotRng::seeded(7);
        for _ in 0..1000 {
            assert!(rng.pick_index(25) < 25);
        }
    }

    #[test]
    fn test_scripted_rng_cycles() {
        let mut rng = ScriptedRng::new([0.1, 0.9]);
        assert_eq!(rng.next_unit(), 0.1);
        assert_eq!(rng.next_unit(), 0.9);
        assert_eq!(rng.next_unit(), 0.1);
        assert_eq!(rng.consumed(), 3);
    }

    #[test]
    fn test_scripted_pick_index() {
        let mut rng = ScriptedRng::new([0.0, 0.5, 1.0]);
        assert_eq!(rng.pick_index(10), 0);
        assert_eq!(rng.pick_index(10), 5);
        // 1.0 is clamped below one, last slot
        assert_eq!(rng.pick_index(10), 9);
    }
}
