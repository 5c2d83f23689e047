//! Tracking data models and settings.

use serde::{Deserialize, Serialize};

/// Portrait output width.
pub const PORTRAIT_WIDTH: u32 = 1080;
/// Portrait output height.
pub const PORTRAIT_HEIGHT: u32 = 1920;

/// A detected face bounding box in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceBox {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A face with the mouth measurements needed for lip-activity scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub face: FaceBox,
    /// Mouth opening height in source pixels
    pub mouth_height: f64,
    /// Mouth width in source pixels
    pub mouth_width: f64,
}

/// One frame of the horizontal crop path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFrame {
    pub frame_index: usize,
    /// Left edge of the crop window, clamped to the frame
    pub crop_x: i32,
    /// Activity score of the frame's winning face (0 when none)
    pub activity: f64,
}

/// Tracking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Largest-face bounding box tracking
    Fast,
    /// Lip-activity speaker tracking
    Smart,
}

/// Source frame geometry and the derived portrait crop window.
#[derive(Debug, Clone, Copy)]
pub struct CropGeometry {
    pub frame_width: u32,
    pub frame_height: u32,
}

impl CropGeometry {
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self { frame_width, frame_height }
    }

    /// Width of the 9:16 crop window for this source height.
    pub fn crop_width(&self) -> u32 {
        (self.frame_height * 9 / 16).min(self.frame_width)
    }

    /// Default crop position centered on the frame.
    pub fn centered_crop_x(&self) -> i32 {
        ((self.frame_width - self.crop_width()) / 2) as i32
    }

    /// Crop left edge for a target face center, clamped into the frame.
    pub fn clamp_crop_x(&self, target_center_x: f64) -> i32 {
        let max_x = (self.frame_width - self.crop_width()) as f64;
        (target_center_x - self.crop_width() as f64 / 2.0).clamp(0.0, max_x) as i32
    }
}

/// Tunable tracker parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Median smoothing window for fast tracking (frames)
    pub smoothing_window_fast: usize,
    /// Median smoothing window for smart tracking (frames)
    pub smoothing_window_smart: usize,
    /// Minimum frames a shot must hold before it may change
    pub min_shot_duration: usize,
    /// Position drift (pixels) that triggers a shot change in fast mode
    pub shot_change_threshold_fast: f64,
    /// Position drift (pixels) that triggers a shot change in smart mode
    pub shot_change_threshold_smart: f64,
    /// Activity a face must show before a smart shot change fires
    pub switch_threshold: f64,
    /// Weight of the center score when picking the active speaker
    pub center_weight: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            smoothing_window_fast: 60,
            smoothing_window_smart: 30,
            min_shot_duration: 90,
            shot_change_threshold_fast: 250.0,
            shot_change_threshold_smart: 200.0,
            switch_threshold: 0.3,
            center_weight: 0.3,
        }
    }
}

impl TrackerSettings {
    /// Smoothing window for a mode.
    pub fn smoothing_window(&self, mode: TrackingMode) -> usize {
        match mode {
            TrackingMode::Fast => self.smoothing_window_fast,
            TrackingMode::Smart => self.smoothing_window_smart,
        }
    }

    /// Shot change drift threshold for a mode.
    pub fn shot_change_threshold(&self, mode: TrackingMode) -> f64 {
        match mode {
            TrackingMode::Fast => self.shot_change_threshold_fast,
            TrackingMode::Smart => self.shot_change_threshold_smart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_width_for_1080p() {
        let geometry = CropGeometry::new(1920, 1080);
        assert_eq!(geometry.crop_width(), 607);
    }

    #[test]
    fn test_clamp_crop_x_bounds() {
        let geometry = CropGeometry::new(1920, 1080);
        let crop_w = geometry.crop_width();

        // Face at the far left edge
        assert_eq!(geometry.clamp_crop_x(0.0), 0);
        // Face at the far right edge
        assert_eq!(
            geometry.clamp_crop_x(1920.0),
            (1920 - crop_w) as i32
        );
        // Centered face
        let centered = geometry.clamp_crop_x(960.0);
        assert_eq!(centered, (960.0 - crop_w as f64 / 2.0) as i32);
    }

    #[test]
    fn test_default_settings() {
        let settings = TrackerSettings::default();
        assert_eq!(settings.smoothing_window(TrackingMode::Fast), 60);
        assert_eq!(settings.smoothing_window(TrackingMode::Smart), 30);
        assert_eq!(settings.shot_change_threshold(TrackingMode::Fast), 250.0);
        assert_eq!(settings.shot_change_threshold(TrackingMode::Smart), 200.0);
    }
}
