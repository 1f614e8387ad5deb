use crate::error::ShareResult;
use crate::pipeline::{PipelineContext, PipelineStage, StepId};
use serde_json::Value;
use std::time::Duration;

/// Stage that encrypts the stored file end-to-end
///
/// Simulated: no key material is generated, the stage only records that the
/// share is marked encrypted.
///
/// # Context Outputs
/// - `encrypted` (bool) - Always `true`
pub struct EncryptionStage {
    duration: Duration,
}

impl EncryptionStage {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for EncryptionStage {
    fn default() -> Self {
        Self::new(Duration::from_millis(1200))
    }
}

impl PipelineStage for EncryptionStage {
    fn id(&self) -> StepId {
        StepId::Encryption
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
        context.set("encrypted", Value::Bool(true));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FileDescriptor;

    #[test]
    fn test_encryption_adds_no_insight() {
        let mut context = PipelineContext::detached(FileDescriptor::new("f", 1, "video/mp4"));
        EncryptionStage::default().execute(&mut context).unwrap();

        assert!(context.insights().unwrap().is_empty());
        assert_eq!(context.get("encrypted"), Some(&Value::Bool(true)));
    }
}
