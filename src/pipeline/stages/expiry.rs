use crate::config::HourRange;
use crate::error::ShareResult;
use crate::insights::expiry_suggestion;
use crate::pipeline::{PipelineContext, PipelineStage, StepId};
use std::time::Duration;

/// Context key holding the suggested expiry in hours
pub const SUGGESTED_EXPIRY_KEY: &str = "suggested_expiry_hours";

/// Stage that suggests a retention window
///
/// Draws a uniform whole number of hours from the configured range and
/// appends it as an insight. The suggestion is advisory: the result record's
/// expiry comes from `UploadConfig::expiry_hours`, not from this value.
///
/// # Context Outputs
/// - `suggested_expiry_hours` (number)
pub struct SmartExpiryStage {
    duration: Duration,
    range: HourRange,
}

impl SmartExpiryStage {
    pub fn new(duration: Duration) -> Self {
        Self::with_range(
            duration,
            HourRange {
                min_hours: 4,
                max_hours: 11,
            },
        )
    }

    pub fn with_range(duration: Duration, range: HourRange) -> Self {
        Self { duration, range }
    }
}

impl Default for SmartExpiryStage {
    fn default() -> Self {
        Self::new(Duration::from_millis(800))
    }
}

impl PipelineStage for SmartExpiryStage {
    fn id(&self) -> StepId {
        StepId::SmartExpiry
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
        let hours = context
            .random()
            .range_inclusive(self.range.min_hours, self.range.max_hours);
        context.set_number(SUGGESTED_EXPIRY_KEY, hours as f64);
        context.push_insight(expiry_suggestion(hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FileDescriptor;

    #[test]
    fn test_suggestion_within_range() {
        for _ in 0..50 {
            let mut context = PipelineContext::detached(FileDescriptor::new("f", 1, "image/gif"));
            SmartExpiryStage::default().execute(&mut context).unwrap();

            let hours = context.get_number(SUGGESTED_EXPIRY_KEY).unwrap() as u32;
            assert!((4..=11).contains(&hours));
            assert_eq!(context.insights().unwrap(), vec![expiry_suggestion(hours)]);
        }
    }

    #[test]
    fn test_custom_range() {
        let stage = SmartExpiryStage::with_range(
            Duration::ZERO,
            HourRange {
                min_hours: 6,
                max_hours: 6,
            },
        );
        let mut context = PipelineContext::detached(FileDescriptor::new("f", 1, "image/gif"));
        stage.execute(&mut context).unwrap();
        assert_eq!(context.get_number(SUGGESTED_EXPIRY_KEY).unwrap(), 6.0);
    }
}
