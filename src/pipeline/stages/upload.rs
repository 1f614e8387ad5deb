use crate::error::ShareResult;
use crate::pipeline::{PipelineContext, PipelineStage, StepId};
use std::time::Duration;
use tracing::debug;

/// Stage that transfers the file
///
/// Simulated: the transfer is the stage delay itself, nothing is written.
///
/// # Context Outputs
/// - `uploaded_bytes` (number) - Size of the transferred file
pub struct UploadStage {
    duration: Duration,
}

impl UploadStage {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for UploadStage {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl PipelineStage for UploadStage {
    fn id(&self) -> StepId {
        StepId::Upload
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
        let size = context.file().size_bytes;
        debug!(
            session_id = %context.session_id(),
            bytes = size,
            "file transferred"
        );
        context.set_number("uploaded_bytes", size as f64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FileDescriptor;

    #[test]
    fn test_upload_stage_records_size() {
        let file = FileDescriptor::new("a.txt", 4096, "text/plain");
        let mut context = PipelineContext::detached(file);
        UploadStage::default().execute(&mut context).unwrap();

        assert_eq!(context.get_number("uploaded_bytes").unwrap(), 4096.0);
        assert!(context.insights().unwrap().is_empty());
    }

    #[test]
    fn test_upload_stage_identity() {
        let stage = UploadStage::default();
        assert_eq!(stage.id(), StepId::Upload);
        assert_eq!(stage.name(), "Secure Upload");
        assert_eq!(stage.duration(), Duration::from_millis(1000));
    }
}
