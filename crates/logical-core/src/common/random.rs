//! Injectable sources of uniform integers.
//!
//! The `call` handler draws its outcome from a [`RandSource`] handed to it at
//! construction, so tests can pin the draw with [`FixedRand`] or
//! [`SequenceRand`] while production uses [`ThreadRandom`].

use core::ops::RangeInclusive;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A source of uniformly distributed integers.
///
/// # Example
/// ```
/// use logical_core::random::{FixedRand, RandSource};
///
/// let rng = FixedRand(3);
/// assert_eq!(rng.rand_range(1..=10), 3);
/// ```
pub trait RandSource: Send + Sync {
    /// Returns an integer drawn from `range`.
    fn rand_range(&self, range: RangeInclusive<u32>) -> u32;
}

/// A `RandSource` backed by the thread-local RNG (`rand::rng()`).
///
/// The type is zero-sized and does not hold the RNG, so it can be shared
/// across tasks even though the underlying `ThreadRng` is not `Send`.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand_range(&self, range: RangeInclusive<u32>) -> u32 {
        use ::rand::Rng;
        ::rand::rng().random_range(range)
    }
}

/// Always returns the same value, clamped into the requested range.
#[derive(Clone, Copy, Debug)]
pub struct FixedRand(pub u32);

impl RandSource for FixedRand {
    fn rand_range(&self, range: RangeInclusive<u32>) -> u32 {
        self.0.clamp(*range.start(), *range.end())
    }
}

/// Cycles through a fixed list of values, clamped into the requested range.
#[derive(Debug)]
pub struct SequenceRand {
    values: Vec<u32>,
    cursor: AtomicUsize,
}

impl SequenceRand {
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn new(values: Vec<u32>) -> Self {
        assert!(!values.is_empty(), "SequenceRand needs at least one value");
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl RandSource for SequenceRand {
    fn rand_range(&self, range: RangeInclusive<u32>) -> u32 {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[idx].clamp(*range.start(), *range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_range() {
        let rng = ThreadRandom;
        let mut seen = [false; 11];
        for _ in 0..10_000 {
            let v = rng.rand_range(1..=10);
            assert!((1..=10).contains(&v));
            seen[v as usize] = true;
        }
        assert!(seen[1..].iter().all(|s| *s), "every value should appear");
    }

    #[test]
    fn fixed_rand_clamps() {
        assert_eq!(FixedRand(9).rand_range(1..=10), 9);
        assert_eq!(FixedRand(0).rand_range(1..=10), 1);
        assert_eq!(FixedRand(42).rand_range(1..=10), 10);
    }

    #[test]
    fn sequence_rand_cycles() {
        let rng = SequenceRand::new(vec![2, 9, 10]);
        let drawn: Vec<u32> = (0..6).map(|_| rng.rand_range(1..=10)).collect();
        assert_eq!(drawn, vec![2, 9, 10, 2, 9, 10]);
    }
}
