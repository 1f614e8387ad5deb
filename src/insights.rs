//! Synthetic analysis findings
//!
//! Insights are plain strings appended to a per-session log as specific
//! stages finish. Their content depends only on the declared media type,
//! except for the advisory expiry suggestion which carries a random number.

use serde::{Deserialize, Serialize};

/// Appended when the virus-scan stage finishes
pub const SCAN_CONFIRMATION: &str = "No malicious content detected";

/// Top-level media category of a declared MIME type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Application,
    Video,
    Audio,
    Other,
}

impl MediaCategory {
    /// Classify by the part before the first `/`, case-insensitively
    pub fn from_media_type(media_type: &str) -> Self {
        let top_level = media_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match top_level.as_str() {
            "image" => MediaCategory::Image,
            "application" => MediaCategory::Application,
            "video" => MediaCategory::Video,
            "audio" => MediaCategory::Audio,
            _ => MediaCategory::Other,
        }
    }
}

/// Findings appended by the content-analysis stage
pub fn analysis_insights(category: MediaCategory) -> &'static [&'static str] {
    match category {
        MediaCategory::Image => &["Image content detected", "High quality resolution"],
        MediaCategory::Application => &["Document format recognized", "Text content analyzed"],
        _ => &["File structure validated"],
    }
}

/// Finding appended by the smart-expiry stage
pub fn expiry_suggestion(hours: u32) -> String {
    format!("AI suggests {}h expiry based on file type", hours)
}

/// Tags attached to a completed upload
pub fn content_tags(media_type: &str) -> Vec<String> {
    let mut tags = vec!["Secure"];

    match MediaCategory::from_media_type(media_type) {
        MediaCategory::Image => tags.extend(["Image", "Visual Content"]),
        MediaCategory::Application => {
            if media_type.to_ascii_lowercase().contains("pdf") {
                tags.extend(["Document", "PDF"]);
            } else {
                tags.extend(["Document", "Data"]);
            }
        }
        MediaCategory::Video => tags.extend(["Video", "Media"]),
        MediaCategory::Audio => tags.extend(["Audio", "Media"]),
        MediaCategory::Other => tags.extend(["File", "Data"]),
    }

    tags.into_iter().map(String::from).collect()
}

/// Append-only insight log for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsightLog {
    entries: Vec<String>,
}

impl InsightLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, insight: impl Into<String>) {
        self.entries.push(insight.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Only called when a new session begins
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
