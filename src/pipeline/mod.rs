//! Sequential stage execution for upload processing
//!
//! A `Pipeline` runs its stages one at a time against a `PipelineContext`.
//! Each stage drives one step of the session's `StepRegistry`: the executor
//! marks it processing, waits out the stage's simulated duration on the
//! injected clock, runs it, and marks it complete (or failed, which halts the
//! run). Stages append insights through the context as they go.
//!
//! # Example
//! ```
//! use secure_share::error::ShareResult;
//! use secure_share::pipeline::{Pipeline, PipelineContext, PipelineStage, StepId};
//! use std::time::Duration;
//!
//! struct Tagger;
//!
//! impl PipelineStage for Tagger {
//!     fn id(&self) -> StepId {
//!         StepId::ContentAnalysis
//!     }
//!
//!     fn duration(&self) -> Duration {
//!         Duration::ZERO
//!     }
//!
//!     fn execute(&self, context: &mut PipelineContext) -> ShareResult<()> {
//!         context.set_string("tag", "reviewed");
//!         Ok(())
//!     }
//! }
//!
//! let pipeline = Pipeline::builder("tagging").add_stage(Tagger).build().unwrap();
//! assert_eq!(pipeline.step_ids(), vec![StepId::ContentAnalysis]);
//! ```

pub mod context;
pub mod core;
pub mod executor;
pub mod registry;
pub mod stages;

// Re-export main types
pub use context::PipelineContext;
pub use core::{PipelineResult, PipelineStage, StageResult};
pub use executor::{Pipeline, PipelineBuilder};
pub use registry::{ProcessingStep, StepId, StepRegistry, StepStatus};
