use crate::error::ShareResult;
use std::time::Duration;

use super::context::PipelineContext;
use super::registry::StepId;

/// A single stage in a pipeline
///
/// The executor marks the stage processing, suspends for `duration()` on the
/// context's clock, then calls `execute()`. A stage that returns an error is
/// marked failed and stops the pipeline.
///
/// # Example
/// ```
/// use secure_share::error::ShareResult;
/// use secure_share::pipeline::{PipelineContext, PipelineStage, StepId};
/// use std::time::Duration;
///
/// struct Checksum;
///
/// impl PipelineStage for Checksum {
///     fn id(&self) -> StepId {
///         StepId::Upload
///     }
///
///     fn duration(&self) -> Duration {
///         Duration::from_millis(250)
///     }
///
///     fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
///         context.push_insight("Checksum verified")
///     }
/// }
/// ```
pub trait PipelineStage: Send + Sync {
    /// Step this stage drives in the registry
    fn id(&self) -> StepId;

    /// Get stage name for logging and progress tracking
    fn name(&self) -> &str {
        self.id().display_name()
    }

    /// Simulated time the stage takes before `execute()` runs
    fn duration(&self) -> Duration;

    /// Execute this stage
    ///
    /// The stage can read from and write to the pipeline context.
    /// If the stage fails, it should return an error which will stop the pipeline.
    fn execute(&self, context: &mut PipelineContext) -> ShareResult<()>;
}

/// Result of a pipeline stage execution
#[derive(Debug, Clone)]
pub struct StageResult {
    pub step_id: StepId,

    /// Stage name
    pub stage_name: String,

    /// Whether the stage succeeded
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,

    /// Duration of execution, including the simulated delay
    pub duration: Duration,
}

impl StageResult {
    /// Create a successful stage result
    pub fn success(step_id: StepId, stage_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            step_id,
            stage_name: stage_name.into(),
            success: true,
            error: None,
            duration,
        }
    }

    /// Create a failed stage result
    pub fn failure(
        step_id: StepId,
        stage_name: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            step_id,
            stage_name: stage_name.into(),
            success: false,
            error: Some(error.into()),
            duration,
        }
    }
}

/// Result of a complete pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Pipeline name
    pub pipeline_name: String,

    /// Whether the pipeline succeeded
    pub success: bool,

    /// Results from each stage that ran
    pub stage_results: Vec<StageResult>,

    /// Total duration
    pub total_duration: Duration,

    /// Error message if failed
    pub error: Option<String>,
}

impl PipelineResult {
    /// Create a successful pipeline result
    pub fn success(
        pipeline_name: impl Into<String>,
        stage_results: Vec<StageResult>,
        total_duration: Duration,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            success: true,
            stage_results,
            total_duration,
            error: None,
        }
    }

    /// Create a failed pipeline result
    pub fn failure(
        pipeline_name: impl Into<String>,
        stage_results: Vec<StageResult>,
        error: impl Into<String>,
        total_duration: Duration,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            success: false,
            stage_results,
            total_duration,
            error: Some(error.into()),
        }
    }

    /// Number of stages that completed successfully
    pub fn completed_stages(&self) -> usize {
        self.stage_results.iter().filter(|r| r.success).count()
    }

    /// Get the stage that failed (if any)
    pub fn failed_stage(&self) -> Option<&StageResult> {
        self.stage_results.iter().find(|r| !r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_result_success() {
        let result = StageResult::success(StepId::Upload, "Secure Upload", Duration::from_secs(1));
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.stage_name, "Secure Upload");
    }

    #[test]
    fn test_stage_result_failure() {
        let result = StageResult::failure(
            StepId::VirusScan,
            "AI Virus Scanning",
            "Something went wrong",
            Duration::from_secs(2),
        );
        assert!(!result.success);
        assert_eq!(result.error, Some("Something went wrong".to_string()));
        assert_eq!(result.step_id, StepId::VirusScan);
    }

    #[test]
    fn test_pipeline_result_success() {
        let stage_results = vec![
            StageResult::success(StepId::Upload, "Stage 1", Duration::from_secs(1)),
            StageResult::success(StepId::VirusScan, "Stage 2", Duration::from_secs(2)),
        ];
        let result =
            PipelineResult::success("Test Pipeline", stage_results, Duration::from_secs(3));

        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.completed_stages(), 2);
        assert!(result.failed_stage().is_none());
    }

    #[test]
    fn test_pipeline_result_failure() {
        let stage_results = vec![
            StageResult::success(StepId::Upload, "Stage 1", Duration::from_secs(1)),
            StageResult::failure(StepId::VirusScan, "Stage 2", "Failed", Duration::from_secs(1)),
        ];
        let result = PipelineResult::failure(
            "Test Pipeline",
            stage_results,
            "Pipeline failed at Stage 2",
            Duration::from_secs(2),
        );

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(result.completed_stages(), 1);
        assert_eq!(result.failed_stage().unwrap().step_id, StepId::VirusScan);
    }
}
