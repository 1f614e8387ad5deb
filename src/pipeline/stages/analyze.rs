use crate::error::ShareResult;
use crate::insights::analysis_insights;
use crate::pipeline::{PipelineContext, PipelineStage, StepId};
use std::time::Duration;
use tracing::debug;

/// Stage that analyzes file content
///
/// Appends one or two findings chosen by the declared media category:
/// images and application documents get two, everything else one generic
/// finding.
pub struct ContentAnalysisStage {
    duration: Duration,
}

impl ContentAnalysisStage {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for ContentAnalysisStage {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

impl PipelineStage for ContentAnalysisStage {
    fn id(&self) -> StepId {
        StepId::ContentAnalysis
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
        let category = context.file().category();
        debug!(
            session_id = %context.session_id(),
            media_type = %context.file().media_type,
            ?category,
            "analyzing content"
        );

        for insight in analysis_insights(category) {
            context.push_insight(*insight)?;
        }
        Ok(())
    }
}
