use crate::error::{ShareError, ShareResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 100 MiB upload ceiling
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Upload processing configuration
///
/// Every field has a default, so a JSON file only needs to carry the values it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted file size in bytes
    pub max_file_size_bytes: u64,

    /// Simulated duration of each processing stage
    pub stage_durations: StageDurations,

    /// Progress ticker settings
    pub progress: ProgressConfig,

    /// Lifetime of a completed upload, in hours
    pub expiry_hours: u32,

    /// Range of the advisory expiry suggested during smart-expiry
    pub suggested_expiry: HourRange,

    /// Range of the synthetic security score
    pub security_score: ScoreRange,
}

/// Simulated stage durations in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageDurations {
    pub upload_ms: u64,
    pub virus_scan_ms: u64,
    pub content_analysis_ms: u64,
    pub smart_expiry_ms: u64,
    pub encryption_ms: u64,
}

/// Progress ticker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressConfig {
    /// Interval between ticks
    pub tick_interval_ms: u64,

    /// Upper bound of the random increment added per tick
    pub max_increment: f64,

    /// Value the ticker holds at until the session completes
    pub hold_at: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HourRange {
    pub min_hours: u32,
    pub max_hours: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreRange {
    pub min: u32,
    pub max: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            stage_durations: StageDurations::default(),
            progress: ProgressConfig::default(),
            expiry_hours: 4,
            suggested_expiry: HourRange {
                min_hours: 4,
                max_hours: 11,
            },
            security_score: ScoreRange { min: 80, max: 99 },
        }
    }
}

impl Default for StageDurations {
    fn default() -> Self {
        Self {
            upload_ms: 1000,
            virus_scan_ms: 2000,
            content_analysis_ms: 1500,
            smart_expiry_ms: 800,
            encryption_ms: 1200,
        }
    }
}

impl StageDurations {
    /// All stages complete without delay
    pub fn zero() -> Self {
        Self {
            upload_ms: 0,
            virus_scan_ms: 0,
            content_analysis_ms: 0,
            smart_expiry_ms: 0,
            encryption_ms: 0,
        }
    }

    /// Sum of all stage durations
    pub fn total(&self) -> Duration {
        Duration::from_millis(
            self.upload_ms
                + self.virus_scan_ms
                + self.content_analysis_ms
                + self.smart_expiry_ms
                + self.encryption_ms,
        )
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 150,
            max_increment: 10.0,
            hold_at: 90.0,
        }
    }
}

impl ProgressConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl UploadConfig {
    /// Configuration with zero stage delays, for demos and fast runs
    pub fn instant() -> Self {
        Self {
            stage_durations: StageDurations::zero(),
            progress: ProgressConfig {
                tick_interval_ms: 1,
                ..ProgressConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ShareResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ShareError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> ShareResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check that the configured ranges are usable
    pub fn validate(&self) -> ShareResult<()> {
        if self.max_file_size_bytes == 0 {
            return Err(ShareError::ConfigError(
                "max_file_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.expiry_hours == 0 {
            return Err(ShareError::ConfigError(
                "expiry_hours must be greater than zero".to_string(),
            ));
        }
        if self.suggested_expiry.min_hours > self.suggested_expiry.max_hours {
            return Err(ShareError::ConfigError(format!(
                "suggested_expiry range is empty: {}..={}",
                self.suggested_expiry.min_hours, self.suggested_expiry.max_hours
            )));
        }
        if self.security_score.min > self.security_score.max || self.security_score.max > 100 {
            return Err(ShareError::ConfigError(format!(
                "security_score must be a range within 0..=100, got {}..={}",
                self.security_score.min, self.security_score.max
            )));
        }
        if self.progress.tick_interval_ms == 0 {
            return Err(ShareError::ConfigError(
                "progress.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.progress.hold_at) || self.progress.max_increment < 0.0 {
            return Err(ShareError::ConfigError(
                "progress.hold_at must be within 0..=100 and max_increment non-negative"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
