use super::context::PipelineContext;
use super::core::{PipelineResult, PipelineStage, StageResult};
use super::registry::{StepId, StepStatus};
use super::stages::{
    ContentAnalysisStage, EncryptionStage, SmartExpiryStage, UploadStage, VirusScanStage,
};
use crate::config::UploadConfig;
use crate::error::{ShareError, ShareResult};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

/// Pipeline executor that runs stages strictly in order
///
/// For each stage: mark it processing, suspend for its duration on the
/// context's clock, run it, then mark it complete with the time it took.
/// A failing stage is marked `error` and later stages stay pending.
///
/// # Example
/// ```no_run
/// # async fn run(mut context: secure_share::pipeline::PipelineContext) -> secure_share::error::ShareResult<()> {
/// use secure_share::config::UploadConfig;
/// use secure_share::pipeline::Pipeline;
///
/// let pipeline = Pipeline::standard(&UploadConfig::default());
/// let result = pipeline.execute(&mut context).await?;
/// assert!(result.success);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    /// The five-stage upload pipeline
    pub fn standard(config: &UploadConfig) -> Self {
        let durations = &config.stage_durations;
        let ms = Duration::from_millis;
        Self {
            name: "secure-upload".to_string(),
            stages: vec![
                Box::new(UploadStage::new(ms(durations.upload_ms))),
                Box::new(VirusScanStage::new(ms(durations.virus_scan_ms))),
                Box::new(ContentAnalysisStage::new(ms(durations.content_analysis_ms))),
                Box::new(SmartExpiryStage::with_range(
                    ms(durations.smart_expiry_ms),
                    config.suggested_expiry,
                )),
                Box::new(EncryptionStage::new(ms(durations.encryption_ms))),
            ],
        }
    }

    /// Get the pipeline name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of stages
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Step ids in execution order
    pub fn step_ids(&self) -> Vec<StepId> {
        self.stages.iter().map(|s| s.id()).collect()
    }

    /// Run every stage against the context's session
    ///
    /// Stage failures are reported through the returned `PipelineResult`;
    /// an `Err` means the session itself could not be updated.
    pub async fn execute(&self, context: &mut PipelineContext) -> ShareResult<PipelineResult> {
        let session_id = context.session_id();
        let total = self.stages.len();
        info!(
            pipeline = %self.name,
            stages = total,
            session_id = %session_id,
            "starting pipeline"
        );

        let clock = context.clock();
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(total);

        for (index, stage) in self.stages.iter().enumerate() {
            let step_id = stage.id();
            let stage_name = stage.name();

            context.transition_step(step_id, StepStatus::Processing, None)?;
            info!(
                step = %step_id,
                "executing stage {}/{} (session: {})",
                index + 1,
                total,
                session_id
            );
            context
                .events()
                .step_started(session_id, step_id, stage_name, index, total);

            let stage_start = Instant::now();
            clock.sleep(stage.duration()).await;
            let execute_result = stage.execute(context);
            let duration = stage_start.elapsed();

            match execute_result {
                Ok(()) => {
                    context.transition_step(step_id, StepStatus::Complete, Some(duration))?;
                    info!(
                        step = %step_id,
                        "stage completed in {:.2}s (session: {})",
                        duration.as_secs_f64(),
                        session_id
                    );
                    context.events().step_completed(
                        session_id,
                        step_id,
                        stage_name,
                        index,
                        total,
                        duration.as_millis() as u64,
                    );
                    stage_results.push(StageResult::success(step_id, stage_name, duration));
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    context.transition_step(step_id, StepStatus::Error, Some(duration))?;
                    error!(
                        step = %step_id,
                        "stage failed: {} (session: {})",
                        error_msg,
                        session_id
                    );
                    context
                        .events()
                        .step_failed(session_id, step_id, stage_name, &error_msg);
                    stage_results.push(StageResult::failure(
                        step_id,
                        stage_name,
                        error_msg.clone(),
                        duration,
                    ));
                    return Ok(PipelineResult::failure(
                        &self.name,
                        stage_results,
                        error_msg,
                        pipeline_start.elapsed(),
                    ));
                }
            }
        }

        let total_duration = pipeline_start.elapsed();
        info!(
            pipeline = %self.name,
            "pipeline completed in {:.2}s (session: {})",
            total_duration.as_secs_f64(),
            session_id
        );

        Ok(PipelineResult::success(
            &self.name,
            stage_results,
            total_duration,
        ))
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Add a stage to the pipeline
    pub fn add_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a boxed stage to the pipeline
    pub fn add_boxed_stage(mut self, stage: Box<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Build the pipeline; each step id may appear only once
    pub fn build(self) -> ShareResult<Pipeline> {
        if self.stages.is_empty() {
            return Err(ShareError::BuilderError(format!(
                "pipeline '{}' has no stages",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.id()) {
                return Err(ShareError::BuilderError(format!(
                    "step '{}' appears more than once in pipeline '{}'",
                    stage.id(),
                    self.name
                )));
            }
        }

        Ok(Pipeline {
            name: self.name,
            stages: self.stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::UploadEvent;
    use crate::session::FileDescriptor;

    // Test stage that succeeds
    struct SuccessStage {
        id: StepId,
        duration: Duration,
    }

    impl SuccessStage {
        fn new(id: StepId, millis: u64) -> Self {
            Self {
                id,
                duration: Duration::from_millis(millis),
            }
        }
    }

    impl PipelineStage for SuccessStage {
        fn id(&self) -> StepId {
            self.id
        }

        fn duration(&self) -> Duration {
            self.duration
        }

        fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
            context.set_string(self.id.as_str(), "executed");
            Ok(())
        }
    }

    // Test stage that fails
    struct FailStage {
        id: StepId,
    }

    impl PipelineStage for FailStage {
        fn id(&self) -> StepId {
            self.id
        }

        fn duration(&self) -> Duration {
            Duration::from_millis(100)
        }

        fn execute(&self, _context: &mut PipelineContext) -> ShareResult<()> {
            Err(ShareError::StageFailed("scanner unavailable".to_string()))
        }
    }

    fn context_for(ids: &[StepId]) -> PipelineContext {
        let context = PipelineContext::detached(FileDescriptor::new("a.bin", 10, ""));
        {
            let mut session = context.session().lock().unwrap();
            session
                .fail("reset for test", chrono::Utc::now())
                .unwrap();
            session
                .begin(
                    context.session_id(),
                    context.file().clone(),
                    ids,
                    chrono::Utc::now(),
                )
                .unwrap();
        }
        context
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_success() {
        let pipeline = Pipeline::builder("test-pipeline")
            .add_stage(SuccessStage::new(StepId::Upload, 1000))
            .add_stage(SuccessStage::new(StepId::VirusScan, 2000))
            .build()
            .unwrap();

        let mut context = context_for(&pipeline.step_ids());
        let result = pipeline.execute(&mut context).await.unwrap();

        assert!(result.success);
        assert_eq!(result.stage_results.len(), 2);
        assert_eq!(result.total_duration, Duration::from_millis(3000));
        assert!(context.has("upload"));
        assert!(context.has("virus-scan"));

        let session = context.session().lock().unwrap();
        assert!(session.steps().all_complete());
        assert_eq!(
            session.steps().get(StepId::VirusScan).unwrap().duration_ms,
            Some(2000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_failure_halts() {
        let pipeline = Pipeline::builder("test-pipeline")
            .add_stage(SuccessStage::new(StepId::Upload, 10))
            .add_stage(FailStage {
                id: StepId::VirusScan,
            })
            .add_stage(SuccessStage::new(StepId::ContentAnalysis, 10))
            .build()
            .unwrap();

        let mut context = context_for(&pipeline.step_ids());
        let result = pipeline.execute(&mut context).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.stage_results.len(), 2);
        assert_eq!(result.failed_stage().unwrap().step_id, StepId::VirusScan);
        assert!(!context.has("content-analysis"));

        let session = context.session().lock().unwrap();
        let steps = session.steps();
        assert_eq!(steps.get(StepId::Upload).unwrap().status, StepStatus::Complete);
        assert_eq!(steps.get(StepId::VirusScan).unwrap().status, StepStatus::Error);
        assert_eq!(
            steps.get(StepId::ContentAnalysis).unwrap().status,
            StepStatus::Pending
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_events_are_ordered() {
        let pipeline = Pipeline::builder("test-pipeline")
            .add_stage(SuccessStage::new(StepId::Upload, 5))
            .add_stage(SuccessStage::new(StepId::VirusScan, 5))
            .build()
            .unwrap();

        let mut context = context_for(&pipeline.step_ids());
        let mut rx = context.events().subscribe();
        pipeline.execute(&mut context).await.unwrap();

        let mut sequence = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                UploadEvent::StepStarted(e) => sequence.push(format!("start:{}", e.step_id)),
                UploadEvent::StepCompleted(e) => sequence.push(format!("done:{}", e.step_id)),
                _ => {}
            }
        }
        assert_eq!(
            sequence,
            [
                "start:upload",
                "done:upload",
                "start:virus-scan",
                "done:virus-scan"
            ]
        );
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = Pipeline::builder("dup")
            .add_stage(SuccessStage::new(StepId::Upload, 1))
            .add_stage(SuccessStage::new(StepId::Upload, 1))
            .build();
        assert!(matches!(result, Err(ShareError::BuilderError(_))));
    }

    #[test]
    fn test_builder_rejects_empty() {
        assert!(Pipeline::builder("empty").build().is_err());
    }

    #[test]
    fn test_standard_pipeline_order() {
        let pipeline = Pipeline::standard(&UploadConfig::default());
        assert_eq!(pipeline.stage_count(), 5);
        assert_eq!(pipeline.step_ids(), StepId::ALL.to_vec());
    }
}
