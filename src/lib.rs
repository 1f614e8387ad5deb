//! Upload processing core for ephemeral secure file sharing
//!
//! A file is accepted by the [`controller::UploadController`], which runs it
//! through five simulated stages (upload, virus scan, content analysis, smart
//! expiry, encryption), accumulates human-readable insights, drives a
//! cosmetic progress value, and produces an [`result::UploadResult`] with a
//! four-digit download code that expires after four hours.
//!
//! Time and randomness are injected through [`clock::Clock`] and
//! [`random::RandomSource`] so runs can be made deterministic.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod history;
pub mod insights;
pub mod logger;
pub mod mock;
pub mod pipeline;
pub mod progress;
pub mod random;
pub mod result;
pub mod session;

pub use config::UploadConfig;
pub use controller::{UploadController, UploadControllerBuilder};
pub use error::{ShareError, ShareResult};
pub use events::{EventEmitter, UploadEvent};
pub use history::{CompletionSink, UploadHistory};
pub use result::UploadResult;
pub use session::{FileDescriptor, SessionSnapshot};
