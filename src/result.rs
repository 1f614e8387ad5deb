use crate::error::{ShareError, ShareResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record produced when a session completes
///
/// Handed to the completion sink and returned to the caller of
/// `accept_file`. All analysis fields are synthetic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Short synthetic identifier (9 chars, base-36)
    pub id: String,

    /// Session that produced this record
    pub session_id: Uuid,

    pub filename: String,
    pub size_bytes: u64,
    pub media_type: String,

    /// 4-digit download code
    pub otp: String,

    /// When processing finished
    pub completed_at: DateTime<Utc>,

    /// When the share stops being downloadable
    pub expiry_time: DateTime<Utc>,

    /// Insight log accumulated during processing
    pub insights: Vec<String>,

    pub security_score: u32,
    pub virus_scanned: bool,
    pub content_tags: Vec<String>,

    /// Expiry suggested by the smart-expiry stage. Advisory only, it does
    /// not feed `expiry_time`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_expiry_hours: Option<u32>,
}

impl UploadResult {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time <= now
    }

    /// Time left before expiry, `None` once expired
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let remaining = self.expiry_time - now;
        if remaining > chrono::Duration::zero() {
            Some(remaining)
        } else {
            None
        }
    }

    /// "Expired", "{h}h {m}m", or "{m}m" under an hour
    pub fn format_time_remaining(&self, now: DateTime<Utc>) -> String {
        match self.time_remaining(now) {
            None => "Expired".to_string(),
            Some(remaining) => {
                let hours = remaining.num_hours();
                let minutes = remaining.num_minutes() % 60;
                if hours > 0 {
                    format!("{}h {}m", hours, minutes)
                } else {
                    format!("{}m", minutes)
                }
            }
        }
    }

    /// Mock download-code check: 4 ASCII digits, matching, not expired
    pub fn verify_code(&self, code: &str, now: DateTime<Utc>) -> ShareResult<()> {
        let code = code.trim();
        if code.len() != 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ShareError::InvalidCode(
                "expected exactly 4 digits".to_string(),
            ));
        }
        if self.is_expired(now) {
            return Err(ShareError::CodeExpired);
        }
        if code != self.otp {
            return Err(ShareError::CodeMismatch);
        }
        Ok(())
    }
}

/// Human-readable size: "0 Bytes", "512 Bytes", "1.5 KB", "2.25 MB"
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
