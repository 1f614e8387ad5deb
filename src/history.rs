use crate::result::UploadResult;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::info;

/// Receiver of completed uploads
///
/// Called exactly once per successful session, after the session has moved to
/// `Completed`. Failed sessions never reach the sink.
pub trait CompletionSink: Send + Sync {
    fn upload_completed(&self, result: &UploadResult);
}

/// In-memory list of completed uploads, newest last
#[derive(Debug, Default)]
pub struct UploadHistory {
    uploads: Mutex<Vec<UploadResult>>,
}

impl UploadHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploads(&self) -> Vec<UploadResult> {
        self.uploads
            .lock()
            .map(|uploads| uploads.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.uploads.lock().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Uploads that have not expired at `now`
    pub fn active(&self, now: DateTime<Utc>) -> Vec<UploadResult> {
        self.uploads()
            .into_iter()
            .filter(|u| !u.is_expired(now))
            .collect()
    }
}

impl CompletionSink for UploadHistory {
    fn upload_completed(&self, result: &UploadResult) {
        info!(
            id = %result.id,
            filename = %result.filename,
            "recording completed upload"
        );
        match self.uploads.lock() {
            Ok(mut uploads) => uploads.push(result.clone()),
            Err(poisoned) => poisoned.into_inner().push(result.clone()),
        }
    }
}
