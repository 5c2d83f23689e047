//! Portrait conversion: analysis pass plus render pass.

use std::path::Path;
use tokio::sync::watch;
use tracing::{info, warn};

use clipper_models::EncoderProfile;

use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;
use crate::tracking::{
    fast, render, speaker, stabilizer, CropGeometry, FaceBoxSource, LandmarkSource,
    TrackerSettings, TrackingMode,
};

/// Converts a landscape clip into a speaker-tracked 9:16 portrait clip.
pub struct PortraitConverter<'a> {
    face_source: &'a dyn FaceBoxSource,
    landmark_source: Option<&'a dyn LandmarkSource>,
    settings: TrackerSettings,
}

impl<'a> PortraitConverter<'a> {
    pub fn new(face_source: &'a dyn FaceBoxSource, settings: TrackerSettings) -> Self {
        Self {
            face_source,
            landmark_source: None,
            settings,
        }
    }

    /// Enable smart tracking with a landmark source.
    pub fn with_landmarks(mut self, source: &'a dyn LandmarkSource) -> Self {
        self.landmark_source = Some(source);
        self
    }

    /// Convert a clip, returning the tracking mode actually used.
    ///
    /// Smart mode falls back to fast tracking for the whole clip when the
    /// landmark detector is unavailable or fails mid-run; cancellation
    /// and timeouts propagate unchanged.
    pub async fn convert(
        &self,
        runner: &FfmpegRunner,
        input: &Path,
        output: &Path,
        requested: TrackingMode,
        cancel_rx: watch::Receiver<bool>,
        profile: &EncoderProfile,
    ) -> MediaResult<TrackingMode> {
        let probe = probe_media(input).await?;
        if probe.width == 0 || probe.height == 0 || probe.fps <= 0.0 {
            return Err(MediaError::InvalidVideo(format!(
                "no usable video stream in {}",
                input.display()
            )));
        }
        let geometry = CropGeometry::new(probe.width, probe.height);

        let (path, used) = self.analyze(input, requested, cancel_rx, &geometry).await?;

        let stabilized = stabilizer::stabilize(&path, &self.settings, used);
        render::render_crop_path(runner, input, output, &stabilized, &geometry, probe.fps, profile)
            .await?;

        Ok(used)
    }

    async fn analyze(
        &self,
        input: &Path,
        requested: TrackingMode,
        cancel_rx: watch::Receiver<bool>,
        geometry: &CropGeometry,
    ) -> MediaResult<(Vec<crate::tracking::CropFrame>, TrackingMode)> {
        if requested == TrackingMode::Smart {
            match self.analyze_smart(input, cancel_rx.clone(), geometry).await {
                Ok(path) => return Ok((path, TrackingMode::Smart)),
                Err(MediaError::DetectorUnavailable(reason)) => {
                    warn!(
                        reason = %reason,
                        "Landmark detector unavailable, retrying clip with fast tracking"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        let observations = self.face_source.observe(input, cancel_rx).await?;
        info!(
            source = self.face_source.name(),
            frames = observations.len(),
            "Fast tracking analysis complete"
        );
        Ok((fast::track(&observations, geometry), TrackingMode::Fast))
    }

    async fn analyze_smart(
        &self,
        input: &Path,
        cancel_rx: watch::Receiver<bool>,
        geometry: &CropGeometry,
    ) -> MediaResult<Vec<crate::tracking::CropFrame>> {
        let source = self.landmark_source.ok_or_else(|| {
            MediaError::detector_unavailable("no landmark source configured")
        })?;

        let observations = source.observe(input, cancel_rx).await?;
        info!(
            source = source.name(),
            frames = observations.len(),
            "Smart tracking analysis complete"
        );
        Ok(speaker::track(&observations, geometry, &self.settings))
    }
}
