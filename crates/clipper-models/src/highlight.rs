//! Highlight models and clip duration bounds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::{validate_span, TimestampError};

/// Shortest acceptable clip (seconds, inclusive).
pub const MIN_CLIP_SECS: f64 = 58.0;

/// Longest acceptable clip (seconds, inclusive).
pub const MAX_CLIP_SECS: f64 = 120.0;

/// Extra candidates requested from the model to survive duration filtering.
pub const OVER_REQUEST_MARGIN: usize = 3;

/// A highlight selected from the transcript.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Highlight {
    /// Start timestamp (HH:MM:SS,mmm)
    pub start_time: String,

    /// End timestamp (HH:MM:SS,mmm)
    pub end_time: String,

    /// Scene title
    pub title: String,

    /// Why this segment was selected
    #[serde(default)]
    pub reason: String,

    /// Spoken intro text for the hook stage
    #[serde(default)]
    pub hook_text: String,

    /// Duration in seconds, computed from the timestamps
    #[serde(default)]
    pub duration_seconds: f64,
}

impl Highlight {
    /// Validate the timestamp pair and fill in `duration_seconds`.
    pub fn with_computed_duration(mut self) -> Result<Self, TimestampError> {
        let span = validate_span(&self.start_time, &self.end_time)?;
        self.duration_seconds = span.duration_secs;
        Ok(self)
    }

    /// Whether the clip length falls inside the acceptable window.
    pub fn duration_acceptable(&self) -> bool {
        self.duration_seconds >= MIN_CLIP_SECS && self.duration_seconds <= MAX_CLIP_SECS
    }
}
