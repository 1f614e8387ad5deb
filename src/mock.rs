//! Deterministic stand-ins for the clock and random source
//!
//! Useful for tests, demos and reproducing a session exactly:
//! - [`FixedClock`] reports a settable wall-clock time while still suspending
//!   on the tokio timer, so paused-time tests advance virtually.
//! - [`ScriptedRandom`] replays queued values and falls back to fixed ones.

use crate::clock::Clock;
use crate::random::RandomSource;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Clock whose `now()` only moves when told to
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// 2025-01-01T00:00:00Z
    pub fn epoch() -> Self {
        Self::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::epoch()
    }
}

#[async_trait]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Random source that replays scripted values
///
/// Floats and integers are scripted independently. Once a queue runs dry the
/// float fallback is returned, and integer draws return the low bound.
/// Scripted integers are clamped into the requested range.
pub struct ScriptedRandom {
    floats: Mutex<VecDeque<f64>>,
    ints: Mutex<VecDeque<u32>>,
    float_fallback: f64,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self {
            floats: Mutex::new(VecDeque::new()),
            ints: Mutex::new(VecDeque::new()),
            float_fallback: 0.5,
        }
    }

    pub fn with_floats(self, values: impl IntoIterator<Item = f64>) -> Self {
        self.floats
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend(values);
        self
    }

    pub fn with_ints(self, values: impl IntoIterator<Item = u32>) -> Self {
        self.ints
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend(values);
        self
    }

    pub fn with_float_fallback(mut self, value: f64) -> Self {
        self.float_fallback = value;
        self
    }
}

impl Default for ScriptedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        self.floats
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or(self.float_fallback)
    }

    fn range_inclusive(&self, low: u32, high: u32) -> u32 {
        let high = high.max(low);
        self.ints
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .map(|value| value.clamp(low, high))
            .unwrap_or(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::epoch();
        let start = clock.now();
        clock.advance(chrono::Duration::hours(2));
        assert_eq!(clock.now() - start, chrono::Duration::hours(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_clock_sleep_does_not_move_now() {
        let clock = FixedClock::epoch();
        let start = clock.now();
        clock.sleep(Duration::from_secs(5)).await;
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_scripted_values_then_fallback() {
        let random = ScriptedRandom::new()
            .with_floats([0.1, 0.9])
            .with_ints([7, 50]);

        assert_eq!(random.next_f64(), 0.1);
        assert_eq!(random.next_f64(), 0.9);
        assert_eq!(random.next_f64(), 0.5);

        assert_eq!(random.range_inclusive(4, 11), 7);
        assert_eq!(random.range_inclusive(4, 11), 11); // clamped
        assert_eq!(random.range_inclusive(4, 11), 4); // fallback
    }
}
