//! Cosmetic progress ticker
//!
//! While a session is processing, a background task raises the session's
//! progress by a random increment on a fixed interval. The value is clamped at
//! the hold point (90 by default) and only reaches 100 when the controller
//! finishes the session. Progress is decoupled from actual step completion.

use crate::clock::Clock;
use crate::config::ProgressConfig;
use crate::events::EventEmitter;
use crate::random::RandomSource;
use crate::session::SharedSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Computes progress values for the ticker
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReporter {
    interval: Duration,
    max_increment: f64,
    hold_at: f64,
}

impl ProgressReporter {
    pub fn new(interval: Duration, max_increment: f64, hold_at: f64) -> Self {
        Self {
            interval,
            max_increment,
            hold_at,
        }
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        Self::new(config.tick_interval(), config.max_increment, config.hold_at)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn hold_at(&self) -> f64 {
        self.hold_at
    }

    /// Next progress value: `min(current + r * max_increment, hold_at)`
    ///
    /// Values already at or above the hold point are returned unchanged.
    pub fn next_value(&self, current: f64, random: &dyn RandomSource) -> f64 {
        if current >= self.hold_at {
            return current;
        }
        let increment = random.next_f64() * self.max_increment;
        (current + increment).min(self.hold_at)
    }

    /// Start ticking for `session_id`
    ///
    /// The task stops by itself once the hold point is reached or the session
    /// is no longer the processing one; otherwise call `ProgressTicker::stop`.
    pub fn spawn(
        &self,
        session: SharedSession,
        session_id: Uuid,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        events: EventEmitter,
    ) -> ProgressTicker {
        let reporter = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                clock.sleep(reporter.interval).await;

                let progress = {
                    let mut guard = match session.lock() {
                        Ok(guard) => guard,
                        Err(e) => {
                            warn!(session_id = %session_id, "progress ticker lost session: {}", e);
                            break;
                        }
                    };
                    if guard.session_id() != Some(session_id) || !guard.is_active() {
                        break;
                    }
                    let current = guard.progress();
                    let next = reporter.next_value(current, random.as_ref());
                    if next <= current {
                        // Zero increment this tick
                        if current >= reporter.hold_at {
                            break;
                        }
                        continue;
                    }
                    guard.advance_progress(next)
                };

                events.progress(session_id, progress);
                if progress >= reporter.hold_at {
                    debug!(session_id = %session_id, progress, "progress holding");
                    break;
                }
            }
        });

        ProgressTicker {
            handle: Some(handle),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::from_config(&ProgressConfig::default())
    }
}

/// Handle to a running progress task; aborts the task when dropped
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Stop the ticker and wait for the task to wind down
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancelled or finished, either is fine
            let _ = handle.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
