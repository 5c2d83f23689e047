//! Single-pass render of a stabilized crop path.
//!
//! The path is compiled into a sendcmd script that retargets a named crop
//! filter at shot boundaries, so the whole clip renders in one FFmpeg
//! invocation with no segment concatenation.

use std::path::Path;
use tracing::{debug, info};

use clipper_models::EncoderProfile;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use super::models::{CropFrame, CropGeometry, PORTRAIT_HEIGHT, PORTRAIT_WIDTH};

/// Positions within this many pixels belong to the same segment.
const SEGMENT_TOLERANCE: i32 = 5;

/// A run of frames sharing one crop position.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSegment {
    /// Segment start time in seconds
    pub start_time: f64,
    /// Crop left edge
    pub crop_x: i32,
}

/// Group a crop path into constant-position segments.
pub fn group_crop_segments(frames: &[CropFrame], fps: f64) -> Vec<CropSegment> {
    if frames.is_empty() || fps <= 0.0 {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = CropSegment {
        start_time: frames[0].frame_index as f64 / fps,
        crop_x: frames[0].crop_x,
    };

    for frame in frames.iter().skip(1) {
        if (frame.crop_x - current.crop_x).abs() > SEGMENT_TOLERANCE {
            segments.push(current.clone());
            current = CropSegment {
                start_time: frame.frame_index as f64 / fps,
                crop_x: frame.crop_x,
            };
        }
    }
    segments.push(current);

    segments
}

/// Build the sendcmd script retargeting the crop at each segment start.
///
/// Format per line: `timestamp [enter] crop@dyncrop x value;`
pub fn build_sendcmd_script(segments: &[CropSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("{:.3} [enter] crop@dyncrop x {}", s.start_time, s.crop_x))
        .collect::<Vec<_>>()
        .join(";\n")
}

/// Render the crop path over the input in a single pass.
pub async fn render_crop_path(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    frames: &[CropFrame],
    geometry: &CropGeometry,
    fps: f64,
    profile: &EncoderProfile,
) -> MediaResult<()> {
    if frames.is_empty() {
        return Err(MediaError::InvalidVideo("empty crop path".to_string()));
    }

    let segments = group_crop_segments(frames, fps);
    info!(
        segments = segments.len(),
        frames = frames.len(),
        "Rendering crop path"
    );

    let script = build_sendcmd_script(&segments);
    let script_path = output.with_extension("sendcmd");
    tokio::fs::write(&script_path, &script).await?;

    let crop_w = geometry.crop_width();
    let filter = format!(
        "setsar=1,format=yuv420p,sendcmd=f='{script}',\
         crop@dyncrop=w={crop_w}:h={crop_h}:x={initial_x}:y=0:exact=1,\
         scale={out_w}:{out_h}:flags=lanczos,setsar=1",
        script = script_path.to_string_lossy(),
        crop_w = crop_w,
        crop_h = geometry.frame_height,
        initial_x = segments[0].crop_x,
        out_w = PORTRAIT_WIDTH,
        out_h = PORTRAIT_HEIGHT,
    );
    debug!("Crop render filter: {}", filter);

    let cmd = FfmpegCommand::new(input, output)
        .video_filter(filter)
        .output_args(profile.to_ffmpeg_args())
        .output_args(["-pix_fmt", "yuv420p", "-vsync", "cfr"])
        .audio_codec("copy");

    let result = runner.run(&cmd).await;
    let _ = tokio::fs::remove_file(&script_path).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize, crop_x: i32) -> CropFrame {
        CropFrame { frame_index: index, crop_x, activity: 0.0 }
    }

    #[test]
    fn test_group_respects_tolerance() {
        let frames = vec![
            frame(0, 100),
            frame(1, 103), // within tolerance
            frame(2, 300), // new segment
            frame(3, 302),
        ];
        let segments = group_crop_segments(&frames, 30.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].crop_x, 100);
        assert_eq!(segments[1].crop_x, 300);
        assert!((segments[1].start_time - 2.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_segment_for_constant_path() {
        let frames: Vec<_> = (0..100).map(|i| frame(i, 500)).collect();
        let segments = group_crop_segments(&frames, 30.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_time, 0.0);
    }

    #[test]
    fn test_sendcmd_script_format() {
        let segments = vec![
            CropSegment { start_time: 0.0, crop_x: 100 },
            CropSegment { start_time: 6.667, crop_x: 400 },
        ];
        let script = build_sendcmd_script(&segments);
        assert!(script.starts_with("0.000 [enter] crop@dyncrop x 100;"));
        assert!(script.contains("6.667 [enter] crop@dyncrop x 400"));
    }

    #[test]
    fn test_empty_path_groups_to_nothing() {
        assert!(group_crop_segments(&[], 30.0).is_empty());
    }
}
