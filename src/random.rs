use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of the synthetic values: scores, codes, suggestions and progress
/// increments.
pub trait RandomSource: Send + Sync {
    /// Uniform float in `[0, 1)`
    fn next_f64(&self) -> f64;

    /// Uniform integer in `[low, high]`
    fn range_inclusive(&self, low: u32, high: u32) -> u32;
}

/// Mutex-guarded `StdRng`, shareable across the sequencer and ticker tasks
pub struct ThreadRandom {
    rng: Mutex<StdRng>,
}

impl ThreadRandom {
    /// Seed from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence from a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        self.with_rng(|rng| rng.gen::<f64>())
    }

    fn range_inclusive(&self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.with_rng(|rng| rng.gen_range(low..=high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_inclusive_bounds() {
        let random = ThreadRandom::new();
        for _ in 0..1000 {
            let value = random.range_inclusive(4, 11);
            assert!((4..=11).contains(&value));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let random = ThreadRandom::new();
        assert_eq!(random.range_inclusive(7, 7), 7);
        assert_eq!(random.range_inclusive(9, 3), 9);
    }

    #[test]
    fn test_next_f64_unit_interval() {
        let random = ThreadRandom::new();
        for _ in 0..1000 {
            let value = random.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = ThreadRandom::seeded(42);
        let b = ThreadRandom::seeded(42);
        let left: Vec<u32> = (0..16).map(|_| a.range_inclusive(0, 1000)).collect();
        let right: Vec<u32> = (0..16).map(|_| b.range_inclusive(0, 1000)).collect();
        assert_eq!(left, right);
    }
}
