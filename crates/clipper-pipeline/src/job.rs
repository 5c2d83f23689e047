//! Clip assembly stages and progress accounting.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use clipper_media::tracking::TrackingMode;
use clipper_media::watermark::WatermarkSettings;

/// Fraction of the job consumed before the first clip starts.
pub const SELECTION_PROGRESS: f64 = 0.3;
/// Fraction of the job spanned by the per-clip loop.
pub const CLIP_SPAN: f64 = 0.6;
/// Progress reported while cleaning up scratch files.
pub const CLEANUP_PROGRESS: f64 = 0.95;

/// One stage of the per-clip state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipStage {
    Cut,
    Portrait,
    Hook,
    Caption,
    Watermark,
    Done,
}

impl ClipStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cut => "cut",
            Self::Portrait => "portrait",
            Self::Hook => "hook",
            Self::Caption => "caption",
            Self::Watermark => "watermark",
            Self::Done => "done",
        }
    }
}

/// Per-job clip options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipOptions {
    /// How many clips to produce
    pub num_clips: usize,
    /// Spoken hook intro on each clip
    pub enable_hook: bool,
    /// Karaoke captions on each clip
    pub enable_captions: bool,
    /// Watermark overlay on each clip
    pub enable_watermark: bool,
    /// Watermark image path (required when enabled)
    pub watermark_path: Option<PathBuf>,
    /// Watermark placement
    pub watermark_settings: WatermarkSettings,
    /// Fast or smart speaker tracking
    pub tracking_mode: TrackingMode,
    /// Try hardware encoding
    pub use_gpu: bool,
    /// Transcript language requested from the downloader
    pub subtitle_lang: String,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            num_clips: 3,
            enable_hook: true,
            enable_captions: true,
            enable_watermark: false,
            watermark_path: None,
            watermark_settings: WatermarkSettings::default(),
            tracking_mode: TrackingMode::Smart,
            use_gpu: false,
            subtitle_lang: "en".to_string(),
        }
    }
}

/// The ordered, enabled stages of one clip.
///
/// Recomputed from the options whenever they change, so toggling a late
/// stage (say watermark without captions) renumbers the remaining stages
/// and the progress denominators with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    stages: Vec<ClipStage>,
}

impl StagePlan {
    pub fn from_options(options: &ClipOptions) -> Self {
        let mut stages = vec![ClipStage::Cut, ClipStage::Portrait];
        if options.enable_hook {
            stages.push(ClipStage::Hook);
        }
        if options.enable_captions {
            stages.push(ClipStage::Caption);
        }
        if options.enable_watermark {
            stages.push(ClipStage::Watermark);
        }
        Self { stages }
    }

    pub fn stages(&self) -> &[ClipStage] {
        &self.stages
    }

    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    /// Position of a stage within this plan.
    pub fn stage_index(&self, stage: ClipStage) -> Option<usize> {
        self.stages.iter().position(|s| *s == stage)
    }

    /// Overall job progress while working on one clip.
    ///
    /// `clip_index` is 1-based; `sub` is the fraction of the current
    /// stage already done.
    pub fn progress(
        &self,
        clip_index: usize,
        total_clips: usize,
        stage: ClipStage,
        sub: f64,
    ) -> f64 {
        if total_clips == 0 {
            return SELECTION_PROGRESS;
        }
        let n = total_clips as f64;
        let stage_idx = self.stage_index(stage).unwrap_or(self.total_stages()) as f64;
        let within = (stage_idx + sub.clamp(0.0, 1.0)) / self.total_stages().max(1) as f64;

        SELECTION_PROGRESS + CLIP_SPAN * (clip_index as f64 - 1.0) / n + (CLIP_SPAN / n) * within
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(hook: bool, captions: bool, watermark: bool) -> ClipOptions {
        ClipOptions {
            enable_hook: hook,
            enable_captions: captions,
            enable_watermark: watermark,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_plan_order() {
        let plan = StagePlan::from_options(&options(true, true, true));
        assert_eq!(
            plan.stages(),
            &[
                ClipStage::Cut,
                ClipStage::Portrait,
                ClipStage::Hook,
                ClipStage::Caption,
                ClipStage::Watermark
            ]
        );
        assert_eq!(plan.total_stages(), 5);
    }

    #[test]
    fn test_watermark_without_captions_renumbers() {
        let plan = StagePlan::from_options(&options(false, false, true));
        assert_eq!(
            plan.stages(),
            &[ClipStage::Cut, ClipStage::Portrait, ClipStage::Watermark]
        );
        // Watermark is stage 2 of 3, not 4 of 5.
        assert_eq!(plan.stage_index(ClipStage::Watermark), Some(2));
        assert_eq!(plan.total_stages(), 3);

        let p = plan.progress(1, 1, ClipStage::Watermark, 0.0);
        assert!((p - (0.3 + 0.6 * 2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_progress_formula() {
        let plan = StagePlan::from_options(&options(true, true, false));
        // 4 stages; clip 2 of 3, portrait stage half done.
        let p = plan.progress(2, 3, ClipStage::Portrait, 0.5);
        let expected = 0.3 + 0.6 * (1.0 / 3.0) + (0.6 / 3.0) * ((1.0 + 0.5) / 4.0);
        assert!((p - expected).abs() < 1e-9);
    }

    #[test]
    fn test_progress_monotonic_across_stages() {
        let plan = StagePlan::from_options(&options(true, true, true));
        let mut last = 0.0;
        for stage in plan.stages() {
            for sub in [0.0, 0.5, 1.0] {
                let p = plan.progress(1, 2, *stage, sub);
                assert!(p >= last);
                last = p;
            }
        }
        // Last stage of the last clip lands at the end of the clip span.
        let end = plan.progress(2, 2, ClipStage::Watermark, 1.0);
        assert!((end - 0.9).abs() < 1e-9);
    }
}
