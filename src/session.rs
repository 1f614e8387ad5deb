//! Upload session state
//!
//! Exactly one session is visible at a time. Starting a new one discards the
//! previous session's steps, insight log, progress and result; uploads already
//! handed to the completion sink are unaffected.
use crate::error::{ShareError, ShareResult};
use crate::insights::{InsightLog, MediaCategory};
use crate::pipeline::{StepId, StepRegistry, StepStatus};
use crate::result::UploadResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Descriptor of the user-selected file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    /// Declared MIME type, possibly empty
    pub media_type: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size_bytes: u64, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            media_type: media_type.into(),
        }
    }

    pub fn category(&self) -> MediaCategory {
        MediaCategory::from_media_type(&self.media_type)
    }
}

/// Lifecycle phase of the active session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    Processing { started_at: DateTime<Utc> },
    Completed { completed_at: DateTime<Utc> },
    Failed { failed_at: DateTime<Utc>, error: String },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Processing { .. } => "Processing",
            SessionPhase::Completed { .. } => "Completed",
            SessionPhase::Failed { .. } => "Failed",
        }
    }
}

/// The single mutable session aggregate
#[derive(Debug, Clone)]
pub struct UploadSession {
    session_id: Option<Uuid>,
    phase: SessionPhase,
    file: Option<FileDescriptor>,
    steps: StepRegistry,
    insights: InsightLog,
    progress: f64,
    result: Option<UploadResult>,
}

/// Session shared between the controller, the sequencer and the ticker
pub type SharedSession = Arc<Mutex<UploadSession>>;

/// Read-only copy handed to observers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub phase: SessionPhase,
    pub file: Option<FileDescriptor>,
    pub steps: Vec<crate::pipeline::ProcessingStep>,
    pub insights: Vec<String>,
    pub progress: f64,
    pub result: Option<UploadResult>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            session_id: None,
            phase: SessionPhase::Idle,
            file: None,
            steps: StepRegistry::default(),
            insights: InsightLog::new(),
            progress: 0.0,
            result: None,
        }
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, SessionPhase::Processing { .. })
    }

    pub fn file(&self) -> Option<&FileDescriptor> {
        self.file.as_ref()
    }

    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    pub fn insights(&self) -> &InsightLog {
        &self.insights
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn result(&self) -> Option<&UploadResult> {
        self.result.as_ref()
    }

    /// Start a new session, discarding the previous one's artifacts
    pub fn begin(
        &mut self,
        session_id: Uuid,
        file: FileDescriptor,
        step_ids: &[StepId],
        now: DateTime<Utc>,
    ) -> ShareResult<()> {
        if self.is_active() {
            return Err(ShareError::UploadInProgress);
        }

        self.session_id = Some(session_id);
        self.phase = SessionPhase::Processing { started_at: now };
        self.file = Some(file);
        self.steps = StepRegistry::from_ids(step_ids);
        self.insights.clear();
        self.progress = 0.0;
        self.result = None;
        Ok(())
    }

    /// Finish the session with its result record
    pub fn complete(&mut self, result: UploadResult, now: DateTime<Utc>) -> ShareResult<()> {
        match self.phase {
            SessionPhase::Processing { .. } => {
                self.phase = SessionPhase::Completed { completed_at: now };
                self.result = Some(result);
                Ok(())
            }
            _ => Err(ShareError::InvalidStateTransition(format!(
                "Cannot complete from {} state",
                self.phase.name()
            ))),
        }
    }

    /// Mark the session failed; steps, insights and progress stay as they are
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> ShareResult<()> {
        match self.phase {
            SessionPhase::Processing { .. } => {
                self.phase = SessionPhase::Failed {
                    failed_at: now,
                    error: error.into(),
                };
                Ok(())
            }
            _ => Err(ShareError::InvalidStateTransition(format!(
                "Cannot fail from {} state",
                self.phase.name()
            ))),
        }
    }

    pub fn transition_step(
        &mut self,
        id: StepId,
        status: StepStatus,
        duration: Option<Duration>,
    ) -> ShareResult<()> {
        self.steps.transition(id, status, duration)
    }

    pub fn push_insight(&mut self, insight: impl Into<String>) {
        self.insights.push(insight);
    }

    /// Raise progress to `value`; never lowers it and never exceeds 100
    pub fn advance_progress(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            self.progress = self.progress.max(value.min(100.0));
        }
        self.progress
    }

    pub fn finish_progress(&mut self) {
        self.progress = 100.0;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            phase: self.phase.clone(),
            file: self.file.clone(),
            steps: self.steps.steps().to_vec(),
            insights: self.insights.entries().to_vec(),
            progress: self.progress,
            result: self.result.clone(),
        }
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}
