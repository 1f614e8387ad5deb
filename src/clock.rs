//! Time source abstraction
//!
//! Stage delays and progress ticks suspend through a [`Clock`] so callers can
//! swap in virtual time. [`SystemClock`] sleeps on the tokio timer, which also
//! honours `tokio::time::pause()` in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real wall clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}
