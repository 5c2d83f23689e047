//! Clip job orchestration.
//!
//! Runs a job end to end: acquire the source, select highlights from the
//! transcript, and assemble each clip through the staged state machine
//! with progress reporting and cooperative cancellation.

pub mod config;
pub mod context;
pub mod error;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod selector;

pub use config::Config;
pub use context::{CancelToken, JobContext};
pub use error::{PipelineError, PipelineResult};
pub use job::{ClipOptions, ClipStage, StagePlan};
pub use pipeline::{ClipOutcome, ClipPipeline, JobRequest};
pub use selector::HighlightSelector;
