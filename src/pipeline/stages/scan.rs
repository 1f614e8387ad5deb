use crate::error::ShareResult;
use crate::insights::SCAN_CONFIRMATION;
use crate::pipeline::{PipelineContext, PipelineStage, StepId};
use std::time::Duration;

/// Stage that scans the file for malicious content
///
/// Simulated: every scan comes back clean and appends the confirmation
/// insight.
pub struct VirusScanStage {
    duration: Duration,
}

impl VirusScanStage {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for VirusScanStage {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

impl PipelineStage for VirusScanStage {
    fn id(&self) -> StepId {
        StepId::VirusScan
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
        context.push_insight(SCAN_CONFIRMATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FileDescriptor;

    #[test]
    fn test_scan_appends_confirmation() {
        let file = FileDescriptor::new("a.exe", 10, "application/octet-stream");
        let mut context = PipelineContext::detached(file);
        VirusScanStage::default().execute(&mut context).unwrap();

        assert_eq!(context.insights().unwrap(), vec![SCAN_CONFIRMATION.to_string()]);
    }
}
