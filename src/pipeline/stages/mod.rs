//! Stages of the upload pipeline
//!
//! Run in this order by `Pipeline::standard`:
//! 1. UploadStage - Secure transfer of the file
//! 2. VirusScanStage - Malware scan, confirms a clean result
//! 3. ContentAnalysisStage - Media-type specific findings
//! 4. SmartExpiryStage - Advisory expiry suggestion
//! 5. EncryptionStage - End-to-end encryption

pub mod analyze;
pub mod encrypt;
pub mod expiry;
pub mod scan;
pub mod upload;

// Re-export stages
pub use analyze::ContentAnalysisStage;
pub use encrypt::EncryptionStage;
pub use expiry::{SmartExpiryStage, SUGGESTED_EXPIRY_KEY};
pub use scan::VirusScanStage;
pub use upload::UploadStage;
