use crate::error::{ShareError, ShareResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifier of a processing stage
///
/// The set is closed; a pipeline runs some ordering of these, each at most once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Upload,
    VirusScan,
    ContentAnalysis,
    SmartExpiry,
    Encryption,
}

impl StepId {
    /// The standard stage order
    pub const ALL: [StepId; 5] = [
        StepId::Upload,
        StepId::VirusScan,
        StepId::ContentAnalysis,
        StepId::SmartExpiry,
        StepId::Encryption,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Upload => "upload",
            StepId::VirusScan => "virus-scan",
            StepId::ContentAnalysis => "content-analysis",
            StepId::SmartExpiry => "smart-expiry",
            StepId::Encryption => "encryption",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StepId::Upload => "Secure Upload",
            StepId::VirusScan => "AI Virus Scanning",
            StepId::ContentAnalysis => "Content Analysis",
            StepId::SmartExpiry => "Smart Expiry Calculation",
            StepId::Encryption => "End-to-End Encryption",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Processing,
    Complete,
    Error,
}

impl StepStatus {
    /// Statuses only move forward: pending → processing → complete | error
    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::Processing)
                | (StepStatus::Processing, StepStatus::Complete)
                | (StepStatus::Processing, StepStatus::Error)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Complete | StepStatus::Error)
    }
}

/// A step as seen by observers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStep {
    pub id: StepId,
    pub display_name: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ProcessingStep {
    pub fn pending(id: StepId) -> Self {
        Self {
            id,
            display_name: id.display_name().to_string(),
            status: StepStatus::Pending,
            duration_ms: None,
        }
    }
}

/// Ordered step list of the active session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRegistry {
    steps: Vec<ProcessingStep>,
}

impl StepRegistry {
    /// All steps start out pending
    pub fn from_ids(ids: &[StepId]) -> Self {
        Self {
            steps: ids.iter().copied().map(ProcessingStep::pending).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::from_ids(&StepId::ALL)
    }

    pub fn steps(&self) -> &[ProcessingStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: StepId) -> Option<&ProcessingStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// The step currently processing, if any
    pub fn current(&self) -> Option<&ProcessingStep> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Processing)
    }

    pub fn processing_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Processing)
            .count()
    }

    pub fn all_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status == StepStatus::Complete)
    }

    /// Move a step to `status`, recording its duration when given
    pub fn transition(
        &mut self,
        id: StepId,
        status: StepStatus,
        duration: Option<Duration>,
    ) -> ShareResult<()> {
        if status == StepStatus::Processing {
            if let Some(current) = self.current() {
                if current.id != id {
                    return Err(ShareError::InvalidStateTransition(format!(
                        "cannot start '{}' while '{}' is processing",
                        id, current.id
                    )));
                }
            }
        }

        let step = self
            .steps
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ShareError::UnknownStep(id.to_string()))?;

        if !step.status.can_transition_to(status) {
            return Err(ShareError::InvalidStateTransition(format!(
                "step '{}' cannot move from {:?} to {:?}",
                id, step.status, status
            )));
        }

        step.status = status;
        if let Some(duration) = duration {
            step.duration_ms = Some(duration.as_millis() as u64);
        }
        Ok(())
    }
}
