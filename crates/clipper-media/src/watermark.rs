//! Watermark overlay.

use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Watermark placement and appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSettings {
    /// Watermark width as a fraction of the video width
    pub scale: f64,
    /// Opacity from 0.0 to 1.0
    pub opacity: f64,
    /// Horizontal position as a fraction of the remaining width
    pub position_x: f64,
    /// Vertical position as a fraction of the remaining height
    pub position_y: f64,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            scale: 0.25,
            opacity: 0.6,
            position_x: 0.5,
            position_y: 0.05,
        }
    }
}

/// Build the overlay filter graph for a watermark image.
///
/// `scale2ref` sizes the watermark against the main video, so the same
/// image works for any clip resolution.
pub fn build_watermark_filter(settings: &WatermarkSettings) -> String {
    format!(
        "[1:v][0:v]scale2ref=w=main_w*{scale}:h=ow/mdar[wm][base];\
         [wm]format=rgba,colorchannelmixer=aa={opacity}[wm2];\
         [base][wm2]overlay=x=(main_w-overlay_w)*{px}:y=(main_h-overlay_h)*{py}",
        scale = settings.scale,
        opacity = settings.opacity,
        px = settings.position_x,
        py = settings.position_y,
    )
}

/// Overlay a watermark image onto a clip.
///
/// A missing watermark file degrades to a plain copy with a warning so
/// one bad asset path cannot fail the clip.
pub async fn apply_watermark(
    runner: &FfmpegRunner,
    input: &Path,
    watermark: &Path,
    output: &Path,
    settings: &WatermarkSettings,
) -> MediaResult<bool> {
    if !watermark.exists() {
        warn!(
            watermark = %watermark.display(),
            "Watermark image missing, copying clip through"
        );
        tokio::fs::copy(input, output).await?;
        return Ok(false);
    }

    info!(watermark = %watermark.display(), "Applying watermark");

    let cmd = FfmpegCommand::new(input, output)
        .extra_input(watermark)
        .filter_complex(build_watermark_filter(settings))
        .audio_codec("copy");

    runner.run(&cmd).await?;
    Ok(true)
}
