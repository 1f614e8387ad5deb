use crate::clock::{Clock, SystemClock};
use crate::config::UploadConfig;
use crate::error::{ShareError, ShareResult};
use crate::events::{EventEmitter, UploadEvent};
use crate::history::CompletionSink;
use crate::insights::content_tags;
use crate::pipeline::stages::SUGGESTED_EXPIRY_KEY;
use crate::pipeline::{Pipeline, PipelineContext, PipelineResult, StepId};
use crate::progress::ProgressReporter;
use crate::random::{RandomSource, ThreadRandom};
use crate::result::UploadResult;
use crate::session::{FileDescriptor, SessionSnapshot, SharedSession, UploadSession};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

const RESULT_ID_LEN: usize = 9;
const RESULT_ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const CANCELLED_REASON: &str = "Upload cancelled";

/// Entry point for uploads
///
/// Owns the single session. `accept_file` validates the file, resets the
/// session, runs the pipeline with the progress ticker alongside, and hands
/// the finished record to the completion sink.
///
/// # Example
/// ```no_run
/// # async fn run() -> secure_share::error::ShareResult<()> {
/// use secure_share::controller::UploadController;
/// use secure_share::session::FileDescriptor;
///
/// let controller = UploadController::builder().build();
/// let result = controller
///     .accept_file(FileDescriptor::new("doc.pdf", 2048, "application/pdf"))
///     .await?;
/// println!("share code: {}", result.otp);
/// # Ok(())
/// # }
/// ```
pub struct UploadController {
    config: UploadConfig,
    pipeline: Arc<Pipeline>,
    session: SharedSession,
    events: EventEmitter,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    sink: Option<Arc<dyn CompletionSink>>,
}

impl UploadController {
    pub fn builder() -> UploadControllerBuilder {
        UploadControllerBuilder::new()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Copy of the current session state
    pub fn snapshot(&self) -> ShareResult<SessionSnapshot> {
        Ok(self.session.lock()?.snapshot())
    }

    /// Process one file end to end
    ///
    /// Rejects files over the size limit without touching the session, and
    /// rejects calls made while another session is still processing. If the
    /// returned future is dropped before it resolves, the session is marked
    /// failed so the next call can start a fresh one.
    pub async fn accept_file(&self, file: FileDescriptor) -> ShareResult<UploadResult> {
        let limit = self.config.max_file_size_bytes;
        if file.size_bytes > limit {
            warn!(
                filename = %file.name,
                size = file.size_bytes,
                limit,
                "rejecting oversized file"
            );
            self.events.upload_rejected(&file.name, file.size_bytes, limit);
            return Err(ShareError::SizeExceeded {
                size: file.size_bytes,
                limit,
            });
        }

        let session_id = Uuid::new_v4();
        let step_ids = self.pipeline.step_ids();
        self.session
            .lock()?
            .begin(session_id, file.clone(), &step_ids, self.clock.now())?;
        let guard = CancelGuard::new(self, session_id);

        info!(
            session_id = %session_id,
            filename = %file.name,
            size = file.size_bytes,
            media_type = %file.media_type,
            "upload session started"
        );
        self.events
            .session_started(session_id, &file.name, file.size_bytes, step_ids.len());

        let ticker = ProgressReporter::from_config(&self.config.progress).spawn(
            Arc::clone(&self.session),
            session_id,
            Arc::clone(&self.clock),
            Arc::clone(&self.random),
            self.events.clone(),
        );

        let mut context = PipelineContext::new(
            session_id,
            file,
            Arc::clone(&self.session),
            self.events.clone(),
            Arc::clone(&self.clock),
            Arc::clone(&self.random),
        );
        let outcome = self.pipeline.execute(&mut context).await;
        ticker.stop().await;

        let finished = match outcome {
            Ok(run) if run.success => self
                .finish(&context, &run)
                .map_err(|e| self.abort(session_id, None, e.to_string())),
            Ok(run) => {
                let stage = run.failed_stage().map(|s| s.step_id);
                let reason = run
                    .error
                    .clone()
                    .unwrap_or_else(|| "pipeline failed".to_string());
                Err(self.abort(session_id, stage, reason))
            }
            Err(e) => Err(self.abort(session_id, None, e.to_string())),
        };
        guard.disarm();
        finished
    }

    fn finish(&self, context: &PipelineContext, run: &PipelineResult) -> ShareResult<UploadResult> {
        let session_id = context.session_id();
        let now = self.clock.now();

        let result = {
            let mut session = self.session.lock()?;

            let file = context.file();
            let score = self.config.security_score;
            let result = UploadResult {
                id: self.result_id(),
                session_id,
                filename: file.name.clone(),
                size_bytes: file.size_bytes,
                media_type: file.media_type.clone(),
                otp: self.random.range_inclusive(1000, 9999).to_string(),
                completed_at: now,
                expiry_time: now + chrono::Duration::hours(i64::from(self.config.expiry_hours)),
                insights: session.insights().entries().to_vec(),
                security_score: self.random.range_inclusive(score.min, score.max),
                virus_scanned: true,
                content_tags: content_tags(&file.media_type),
                suggested_expiry_hours: context
                    .get_number(SUGGESTED_EXPIRY_KEY)
                    .ok()
                    .map(|h| h as u32),
            };
            session.complete(result.clone(), now)?;
            session.finish_progress();
            result
        };

        self.events.progress(session_id, 100.0);
        let total_ms = run.total_duration.as_millis() as u64;
        info!(
            session_id = %session_id,
            result_id = %result.id,
            total_ms,
            "upload session completed"
        );
        self.events.session_completed(session_id, &result.id, total_ms);

        if let Some(sink) = &self.sink {
            sink.upload_completed(&result);
        }
        Ok(result)
    }

    /// Mark the session failed and build the error returned to the caller
    fn abort(&self, session_id: Uuid, stage: Option<StepId>, reason: String) -> ShareError {
        error!(
            session_id = %session_id,
            stage = ?stage,
            "upload session failed: {}",
            reason
        );
        self.mark_failed(session_id, &reason);
        self.events.session_failed(session_id, stage, &reason);
        ShareError::ProcessingFailed { stage, reason }
    }

    /// Move the session to `Failed` if it is still this session and processing
    fn mark_failed(&self, session_id: Uuid, reason: &str) -> bool {
        match self.session.lock() {
            Ok(mut session) => {
                if session.session_id() != Some(session_id) || !session.is_active() {
                    return false;
                }
                match session.fail(reason, self.clock.now()) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(session_id = %session_id, "could not mark session failed: {}", e);
                        false
                    }
                }
            }
            Err(e) => {
                warn!(session_id = %session_id, "could not mark session failed: {}", e);
                false
            }
        }
    }

    fn result_id(&self) -> String {
        (0..RESULT_ID_LEN)
            .map(|_| {
                let index = self.random.range_inclusive(0, 35) as usize;
                RESULT_ID_ALPHABET[index % RESULT_ID_ALPHABET.len()] as char
            })
            .collect()
    }
}

/// Fails the session if `accept_file` is dropped mid-flight
struct CancelGuard<'a> {
    controller: &'a UploadController,
    session_id: Uuid,
    armed: bool,
}

impl<'a> CancelGuard<'a> {
    fn new(controller: &'a UploadController, session_id: Uuid) -> Self {
        Self {
            controller,
            session_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.controller.mark_failed(self.session_id, CANCELLED_REASON) {
            warn!(session_id = %self.session_id, "upload session cancelled");
            self.controller
                .events
                .session_failed(self.session_id, None, CANCELLED_REASON);
        }
    }
}

/// Builder for `UploadController`
///
/// Defaults: `UploadConfig::default()`, system clock, entropy-seeded
/// randomness, the standard five-stage pipeline, no completion sink. Unless
/// an emitter is supplied, event timestamps use the configured clock.
#[derive(Default)]
pub struct UploadControllerBuilder {
    config: Option<UploadConfig>,
    clock: Option<Arc<dyn Clock>>,
    random: Option<Arc<dyn RandomSource>>,
    sink: Option<Arc<dyn CompletionSink>>,
    pipeline: Option<Pipeline>,
    events: Option<EventEmitter>,
}

impl UploadControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: UploadConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn CompletionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the standard pipeline
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn events(mut self, events: EventEmitter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> UploadController {
        let config = self.config.unwrap_or_default();
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| Pipeline::standard(&config));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let events = self
            .events
            .unwrap_or_else(|| EventEmitter::with_clock(256, Arc::clone(&clock)));

        UploadController {
            pipeline: Arc::new(pipeline),
            session: UploadSession::shared(),
            events,
            clock,
            random: self
                .random
                .unwrap_or_else(|| Arc::new(ThreadRandom::new())),
            sink: self.sink,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FixedClock, ScriptedRandom};
    use crate::session::SessionPhase;

    fn controller(random: ScriptedRandom) -> UploadController {
        UploadController::builder()
            .config(UploadConfig::instant())
            .clock(Arc::new(FixedClock::epoch()))
            .random(Arc::new(random))
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_fields_from_random_source() {
        // smart expiry, 9 id chars, otp, score
        let ints = [7, 10, 11, 12, 13, 14, 15, 16, 17, 35, 4321, 93];
        let controller = controller(ScriptedRandom::new().with_ints(ints));

        let result = controller
            .accept_file(FileDescriptor::new("doc.pdf", 2048, "application/pdf"))
            .await
            .unwrap();

        assert_eq!(result.suggested_expiry_hours, Some(7));
        assert_eq!(result.id, "abcdefghz");
        assert_eq!(result.otp, "4321");
        assert_eq!(result.security_score, 93);
        assert!(result.virus_scanned);
        assert_eq!(
            result.expiry_time - result.completed_at,
            chrono::Duration::hours(4)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_file_leaves_session_idle() {
        let controller = controller(ScriptedRandom::new());
        let err = controller
            .accept_file(FileDescriptor::new("big.iso", 100 * 1024 * 1024 + 1, ""))
            .await
            .unwrap_err();

        assert!(matches!(err, ShareError::SizeExceeded { .. }));
        let snapshot = controller.snapshot().unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert!(snapshot.steps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_limit_is_accepted() {
        let controller = controller(ScriptedRandom::new());
        let result = controller
            .accept_file(FileDescriptor::new("edge.bin", 100 * 1024 * 1024, ""))
            .await;
        assert!(result.is_ok());
    }
}
