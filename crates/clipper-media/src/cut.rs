//! Segment extraction from the source video.

use std::path::Path;
use tracing::info;

use clipper_models::EncoderProfile;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Cut `[start_secs, end_secs]` out of the source, re-encoding with the
/// job profile so downstream filter passes start from a clean stream.
/// Render progress is reported as a fraction of the requested span.
pub async fn cut_segment<F>(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    start_secs: f64,
    end_secs: f64,
    profile: &EncoderProfile,
    on_progress: F,
) -> MediaResult<()>
where
    F: Fn(f64) + Send + 'static,
{
    info!(
        start = start_secs,
        end = end_secs,
        output = %output.display(),
        "Cutting segment"
    );

    let span = end_secs - start_secs;
    let cmd = FfmpegCommand::new(input, output)
        .seek(start_secs)
        .until(end_secs)
        .output_args(profile.to_ffmpeg_args())
        .audio_codec("aac")
        .audio_bitrate("192k");

    runner
        .run_with_progress(&cmd, move |p| on_progress(p.fraction(span)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_args_include_span_and_profile() {
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4")
            .seek(60.0)
            .until(130.0)
            .output_args(EncoderProfile::cpu().to_ffmpeg_args())
            .audio_codec("aac")
            .audio_bitrate("192k");
        let args = cmd.build_args();
        assert!(args.windows(2).any(|w| w[0] == "-ss" && w[1] == "60.000"));
        assert!(args.windows(2).any(|w| w[0] == "-to" && w[1] == "130.000"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-b:a" && w[1] == "192k"));
    }
}
