use crate::clock::Clock;
use crate::error::{ShareError, ShareResult};
use crate::events::EventEmitter;
use crate::pipeline::{StepId, StepStatus};
use crate::random::RandomSource;
use crate::session::{FileDescriptor, SharedSession};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Pipeline context that holds data passed between stages
///
/// The context ties one pipeline run to its session: stages append insights
/// and the executor moves steps through it, while the key/value store carries
/// stage outputs (such as the suggested expiry) to whoever assembles the
/// result.
///
/// # Example
/// ```
/// use secure_share::pipeline::PipelineContext;
/// use secure_share::session::FileDescriptor;
///
/// let mut context = PipelineContext::detached(FileDescriptor::new("a.png", 10, "image/png"));
/// context.set_number("suggested_expiry_hours", 6.0);
/// assert_eq!(context.get_number("suggested_expiry_hours").unwrap(), 6.0);
/// ```
#[derive(Clone)]
pub struct PipelineContext {
    session_id: Uuid,
    file: FileDescriptor,
    session: SharedSession,
    events: EventEmitter,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,

    /// Key-value store for stage outputs
    data: HashMap<String, Value>,
}

impl PipelineContext {
    pub fn new(
        session_id: Uuid,
        file: FileDescriptor,
        session: SharedSession,
        events: EventEmitter,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            session_id,
            file,
            session,
            events,
            clock,
            random,
            data: HashMap::new(),
        }
    }

    /// Context with a private session and system clock/randomness,
    /// for running stages outside a controller
    pub fn detached(file: FileDescriptor) -> Self {
        let session_id = Uuid::new_v4();
        let session = crate::session::UploadSession::shared();
        if let Ok(mut guard) = session.lock() {
            let _ = guard.begin(
                session_id,
                file.clone(),
                &StepId::ALL,
                chrono::Utc::now(),
            );
        }
        Self::new(
            session_id,
            file,
            session,
            EventEmitter::default(),
            Arc::new(crate::clock::SystemClock),
            Arc::new(crate::random::ThreadRandom::new()),
        )
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }

    /// Append an insight to the session log and notify observers
    pub fn push_insight(&self, insight: impl Into<String>) -> ShareResult<()> {
        let insight = insight.into();
        let index = {
            let mut session = self.session.lock()?;
            session.push_insight(insight.clone());
            session.insights().len() - 1
        };
        tracing::debug!(session_id = %self.session_id, insight = %insight, "insight added");
        self.events.insight_added(self.session_id, &insight, index);
        Ok(())
    }

    /// Move a step of the shared registry
    pub fn transition_step(
        &self,
        id: StepId,
        status: StepStatus,
        duration: Option<Duration>,
    ) -> ShareResult<()> {
        self.session.lock()?.transition_step(id, status, duration)
    }

    /// Insights accumulated so far in this session
    pub fn insights(&self) -> ShareResult<Vec<String>> {
        Ok(self.session.lock()?.insights().entries().to_vec())
    }

    /// Set a value in the context
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a value from the context or return an error if not found
    pub fn get_required(&self, key: &str) -> ShareResult<&Value> {
        self.data.get(key).ok_or_else(|| {
            ShareError::PipelineError(format!("Required context key not found: {}", key))
        })
    }

    /// Set a string value
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), Value::String(value.into()));
    }

    /// Get a string value
    pub fn get_string(&self, key: &str) -> ShareResult<String> {
        match self.get_required(key)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(ShareError::PipelineError(format!(
                "Context key '{}' is not a string",
                key
            ))),
        }
    }

    /// Set a number value; non-finite numbers are ignored
    pub fn set_number(&mut self, key: impl Into<String>, value: f64) {
        if let Some(number) = serde_json::Number::from_f64(value) {
            self.data.insert(key.into(), Value::Number(number));
        }
    }

    /// Get a number value
    pub fn get_number(&self, key: &str) -> ShareResult<f64> {
        match self.get_required(key)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| {
                ShareError::PipelineError(format!("Context key '{}' is not a valid number", key))
            }),
            _ => Err(ShareError::PipelineError(format!(
                "Context key '{}' is not a number",
                key
            ))),
        }
    }

    /// Check if a key exists in the context
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Get all data keys
    pub fn keys(&self) -> Vec<&String> {
        self.data.keys().collect()
    }
}
