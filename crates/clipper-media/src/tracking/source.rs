//! Observation source traits for face detectors.
//!
//! Detection itself is an external collaborator; these traits give the
//! trackers a uniform per-frame view of what a detector saw, and let
//! tests drive the trackers with scripted observations.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::watch;

use crate::error::MediaResult;
use super::models::{FaceBox, FaceLandmarks};

/// Per-frame face bounding boxes for fast tracking.
#[async_trait]
pub trait FaceBoxSource: Send + Sync {
    /// Observe every frame of a clip.
    ///
    /// Returns one (possibly empty) vector of boxes per frame, in frame
    /// order. Implementations must poll `cancel_rx` between frames and
    /// return `MediaError::Cancelled` once it flips.
    async fn observe(
        &self,
        video_path: &Path,
        cancel_rx: watch::Receiver<bool>,
    ) -> MediaResult<Vec<Vec<FaceBox>>>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Per-frame face landmarks for smart (lip-activity) tracking.
#[async_trait]
pub trait LandmarkSource: Send + Sync {
    /// Observe every frame of a clip with mouth landmarks.
    ///
    /// Returns `MediaError::DetectorUnavailable` when the landmark model
    /// cannot run; the caller falls back to fast tracking for the whole
    /// clip.
    async fn observe(
        &self,
        video_path: &Path,
        cancel_rx: watch::Receiver<bool>,
    ) -> MediaResult<Vec<Vec<FaceLandmarks>>>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}
