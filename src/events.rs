use crate::clock::{Clock, SystemClock};
use crate::pipeline::StepId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Event names - centralized for consistency
pub mod event_names {
    pub const SESSION_STARTED: &str = "upload:session-started";
    pub const STEP_STARTED: &str = "upload:step-started";
    pub const STEP_COMPLETED: &str = "upload:step-completed";
    pub const STEP_FAILED: &str = "upload:step-failed";
    pub const INSIGHT_ADDED: &str = "upload:insight-added";
    pub const PROGRESS: &str = "upload:progress";
    pub const SESSION_COMPLETED: &str = "upload:session-completed";
    pub const SESSION_FAILED: &str = "upload:session-failed";
    pub const UPLOAD_REJECTED: &str = "upload:rejected";
}

/// Session started event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedEvent {
    pub session_id: Uuid,
    pub filename: String,
    pub size_bytes: u64,
    pub total_steps: usize,
    pub timestamp: String,
}

/// Step started event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepStartedEvent {
    pub session_id: Uuid,
    pub step_id: StepId,
    pub step_name: String,
    pub step_index: usize,
    pub total_steps: usize,
    pub timestamp: String,
}

/// Step completed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepCompletedEvent {
    pub session_id: Uuid,
    pub step_id: StepId,
    pub step_name: String,
    pub step_index: usize,
    pub total_steps: usize,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// Step failed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepFailedEvent {
    pub session_id: Uuid,
    pub step_id: StepId,
    pub step_name: String,
    pub error: String,
    pub timestamp: String,
}

/// Insight appended to the session log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightAddedEvent {
    pub session_id: Uuid,
    pub insight: String,
    pub index: usize,
    pub timestamp: String,
}

/// Progress changed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub session_id: Uuid,
    pub progress: f64,
    pub timestamp: String,
}

/// Session completed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionCompletedEvent {
    pub session_id: Uuid,
    pub result_id: String,
    pub total_duration_ms: u64,
    pub timestamp: String,
}

/// Session failed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionFailedEvent {
    pub session_id: Uuid,
    pub failed_step: Option<StepId>,
    pub error: String,
    pub timestamp: String,
}

/// File refused before any processing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadRejectedEvent {
    pub filename: String,
    pub size_bytes: u64,
    pub limit_bytes: u64,
    pub timestamp: String,
}

/// Everything an observer can receive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload")]
pub enum UploadEvent {
    #[serde(rename = "upload:session-started")]
    SessionStarted(SessionStartedEvent),
    #[serde(rename = "upload:step-started")]
    StepStarted(StepStartedEvent),
    #[serde(rename = "upload:step-completed")]
    StepCompleted(StepCompletedEvent),
    #[serde(rename = "upload:step-failed")]
    StepFailed(StepFailedEvent),
    #[serde(rename = "upload:insight-added")]
    InsightAdded(InsightAddedEvent),
    #[serde(rename = "upload:progress")]
    Progress(ProgressEvent),
    #[serde(rename = "upload:session-completed")]
    SessionCompleted(SessionCompletedEvent),
    #[serde(rename = "upload:session-failed")]
    SessionFailed(SessionFailedEvent),
    #[serde(rename = "upload:rejected")]
    UploadRejected(UploadRejectedEvent),
}

impl UploadEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UploadEvent::SessionStarted(_) => event_names::SESSION_STARTED,
            UploadEvent::StepStarted(_) => event_names::STEP_STARTED,
            UploadEvent::StepCompleted(_) => event_names::STEP_COMPLETED,
            UploadEvent::StepFailed(_) => event_names::STEP_FAILED,
            UploadEvent::InsightAdded(_) => event_names::INSIGHT_ADDED,
            UploadEvent::Progress(_) => event_names::PROGRESS,
            UploadEvent::SessionCompleted(_) => event_names::SESSION_COMPLETED,
            UploadEvent::SessionFailed(_) => event_names::SESSION_FAILED,
            UploadEvent::UploadRejected(_) => event_names::UPLOAD_REJECTED,
        }
    }
}

/// Broadcasts upload events to any number of subscribers
///
/// Emission never fails: with no subscribers the event is dropped, and slow
/// subscribers see `RecvError::Lagged` rather than blocking the pipeline.
/// Timestamps come from the emitter's clock.
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<UploadEvent>,
    clock: Arc<dyn Clock>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, clock }
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.sender.subscribe()
    }

    fn emit(&self, event: UploadEvent) {
        tracing::trace!(event = event.name(), "emitting upload event");
        let _ = self.sender.send(event);
    }

    /// Emit session started event
    pub fn session_started(
        &self,
        session_id: Uuid,
        filename: &str,
        size_bytes: u64,
        total_steps: usize,
    ) {
        self.emit(UploadEvent::SessionStarted(SessionStartedEvent {
            session_id,
            filename: filename.to_string(),
            size_bytes,
            total_steps,
            timestamp: self.timestamp(),
        }));
    }

    /// Emit step started event
    pub fn step_started(
        &self,
        session_id: Uuid,
        step_id: StepId,
        step_name: &str,
        step_index: usize,
        total_steps: usize,
    ) {
        self.emit(UploadEvent::StepStarted(StepStartedEvent {
            session_id,
            step_id,
            step_name: step_name.to_string(),
            step_index,
            total_steps,
            timestamp: self.timestamp(),
        }));
    }

    /// Emit step completed event
    pub fn step_completed(
        &self,
        session_id: Uuid,
        step_id: StepId,
        step_name: &str,
        step_index: usize,
        total_steps: usize,
        duration_ms: u64,
    ) {
        self.emit(UploadEvent::StepCompleted(StepCompletedEvent {
            session_id,
            step_id,
            step_name: step_name.to_string(),
            step_index,
            total_steps,
            duration_ms,
            timestamp: self.timestamp(),
        }));
    }

    /// Emit step failed event
    pub fn step_failed(&self, session_id: Uuid, step_id: StepId, step_name: &str, error: &str) {
        self.emit(UploadEvent::StepFailed(StepFailedEvent {
            session_id,
            step_id,
            step_name: step_name.to_string(),
            error: error.to_string(),
            timestamp: self.timestamp(),
        }));
    }

    pub fn insight_added(&self, session_id: Uuid, insight: &str, index: usize) {
        self.emit(UploadEvent::InsightAdded(InsightAddedEvent {
            session_id,
            insight: insight.to_string(),
            index,
            timestamp: self.timestamp(),
        }));
    }

    pub fn progress(&self, session_id: Uuid, progress: f64) {
        self.emit(UploadEvent::Progress(ProgressEvent {
            session_id,
            progress,
            timestamp: self.timestamp(),
        }));
    }

    pub fn session_completed(&self, session_id: Uuid, result_id: &str, total_duration_ms: u64) {
        self.emit(UploadEvent::SessionCompleted(SessionCompletedEvent {
            session_id,
            result_id: result_id.to_string(),
            total_duration_ms,
            timestamp: self.timestamp(),
        }));
    }

    pub fn session_failed(&self, session_id: Uuid, failed_step: Option<StepId>, error: &str) {
        self.emit(UploadEvent::SessionFailed(SessionFailedEvent {
            session_id,
            failed_step,
            error: error.to_string(),
            timestamp: self.timestamp(),
        }));
    }

    pub fn upload_rejected(&self, filename: &str, size_bytes: u64, limit_bytes: u64) {
        self.emit(UploadEvent::UploadRejected(UploadRejectedEvent {
            filename: filename.to_string(),
            size_bytes,
            limit_bytes,
            timestamp: self.timestamp(),
        }));
    }
}

/// Next event for a subscriber, skipping over any it fell behind on
///
/// Returns `None` once every emitter has been dropped and the backlog is
/// drained.
pub async fn next_event(rx: &mut broadcast::Receiver<UploadEvent>) -> Option<UploadEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let emitter = EventEmitter::default();
        emitter.progress(Uuid::new_v4(), 12.5);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let emitter = EventEmitter::default();
        let mut rx = emitter.subscribe();
        let session_id = Uuid::new_v4();

        emitter.step_started(session_id, StepId::Upload, "Secure Upload", 0, 5);
        emitter.step_completed(session_id, StepId::Upload, "Secure Upload", 0, 5, 1000);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.name(), event_names::STEP_STARTED);
        assert_eq!(second.name(), event_names::STEP_COMPLETED);
    }

    #[tokio::test]
    async fn test_next_event_survives_lag() {
        let emitter = EventEmitter::new(2);
        let mut rx = emitter.subscribe();
        for i in 0..5 {
            emitter.progress(Uuid::nil(), i as f64);
        }
        drop(emitter);

        let mut received = Vec::new();
        while let Some(UploadEvent::Progress(e)) = next_event(&mut rx).await {
            received.push(e.progress);
        }
        assert_eq!(received, [3.0, 4.0]);
    }

    #[test]
    fn test_timestamps_follow_clock() {
        let emitter = EventEmitter::with_clock(8, Arc::new(crate::mock::FixedClock::epoch()));
        let mut rx = emitter.subscribe();
        emitter.progress(Uuid::nil(), 40.0);

        match rx.try_recv().unwrap() {
            UploadEvent::Progress(e) => assert_eq!(e.timestamp, "2025-01-01T00:00:00+00:00"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = UploadEvent::StepCompleted(StepCompletedEvent {
            session_id: Uuid::nil(),
            step_id: StepId::VirusScan,
            step_name: "AI Virus Scanning".to_string(),
            step_index: 1,
            total_steps: 5,
            duration_ms: 2000,
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "upload:step-completed");
        assert_eq!(json["payload"]["stepId"], "virus-scan");
        assert_eq!(json["payload"]["durationMs"], 2000);

        let back: UploadEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
