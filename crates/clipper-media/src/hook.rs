//! Hook intro composition.
//!
//! A hook is a short spoken intro: the synthesized hook audio plays over
//! the frozen first frame of the clip with the hook text drawn on top,
//! then the main clip follows. Both parts are encoded to identical
//! parameters so the concat demuxer can join them without re-encoding.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use clipper_models::EncoderProfile;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_duration, probe_media, MediaProbe};

/// Silence appended after the spoken hook (seconds).
const HOOK_PAD_SECS: f64 = 0.5;

/// Hook duration used when the audio cannot be probed.
const HOOK_FALLBACK_SECS: f64 = 3.0;

/// Words per rendered hook text line.
const HOOK_WORDS_PER_LINE: usize = 3;

/// Compose a hook intro onto a clip.
///
/// Returns the hook duration in seconds, which downstream caption timing
/// uses as its offset.
pub async fn compose_hook(
    runner: &FfmpegRunner,
    clip: &Path,
    hook_audio: &Path,
    hook_text: &str,
    output: &Path,
    profile: &EncoderProfile,
) -> MediaResult<f64> {
    let hook_duration = match probe_duration(hook_audio).await {
        Ok(d) if d > 0.0 => d + HOOK_PAD_SECS,
        Ok(_) => HOOK_FALLBACK_SECS,
        Err(e) => {
            warn!("Could not probe hook audio ({}), assuming {}s", e, HOOK_FALLBACK_SECS);
            HOOK_FALLBACK_SECS
        }
    };

    let clip_probe = probe_media(clip).await?;
    if clip_probe.width == 0 || clip_probe.fps <= 0.0 {
        return Err(MediaError::InvalidVideo(format!(
            "no usable video stream in {}",
            clip.display()
        )));
    }

    let work_dir = output
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let frame_path = work_dir.join("hook_frame.png");
    let hook_clip = work_dir.join("hook_segment.mp4");
    let main_clip = work_dir.join("hook_main.mp4");

    extract_first_frame(runner, clip, &frame_path).await?;
    render_hook_segment(
        runner,
        &frame_path,
        hook_audio,
        hook_text,
        hook_duration,
        &clip_probe,
        &hook_clip,
        profile,
    )
    .await?;
    normalize_main_clip(runner, clip, &main_clip, &clip_probe, profile).await?;

    if let Err(e) = concat_copy(runner, &hook_clip, &main_clip, output, &work_dir).await {
        warn!("Concat demuxer failed ({}), falling back to filter concat", e);
        concat_filter(runner, &hook_clip, &main_clip, output, &clip_probe, profile).await?;
    }

    for scratch in [&frame_path, &hook_clip, &main_clip] {
        let _ = tokio::fs::remove_file(scratch).await;
    }

    info!(duration = hook_duration, "Hook composed");
    Ok(hook_duration)
}

async fn extract_first_frame(
    runner: &FfmpegRunner,
    clip: &Path,
    frame_path: &Path,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(clip, frame_path).output_args(["-vframes", "1"]);
    runner.run(&cmd).await
}

#[allow(clippy::too_many_arguments)]
async fn render_hook_segment(
    runner: &FfmpegRunner,
    frame: &Path,
    hook_audio: &Path,
    hook_text: &str,
    duration: f64,
    clip_probe: &MediaProbe,
    output: &Path,
    profile: &EncoderProfile,
) -> MediaResult<()> {
    let text = escape_drawtext(&wrap_hook_text(hook_text, HOOK_WORDS_PER_LINE));
    let filter = format!(
        "scale={w}:{h},fps={fps:.3},drawtext=text='{text}':\
         fontsize=64:fontcolor=gold:box=1:boxcolor=white@0.85:boxborderw=24:\
         x=(w-text_w)/2:y=h/5",
        w = clip_probe.width,
        h = clip_probe.height,
        fps = clip_probe.fps,
        text = text,
    );

    let mut cmd = FfmpegCommand::new(frame, output)
        .input_args(["-loop", "1"])
        .extra_input(hook_audio)
        .output_args(["-t", &format!("{:.3}", duration)])
        .video_filter(filter)
        .output_args(profile.to_ffmpeg_args())
        .output_args(["-pix_fmt", pix_fmt_or_default(clip_probe)])
        .audio_codec("aac")
        .audio_bitrate("192k");
    if clip_probe.sample_rate > 0 {
        cmd = cmd.output_args(["-ar", &clip_probe.sample_rate.to_string()]);
    }
    if clip_probe.channels > 0 {
        cmd = cmd.output_args(["-ac", &clip_probe.channels.to_string()]);
    }

    runner.run(&cmd).await
}

/// Re-encode the main clip to the exact parameters of the hook segment.
async fn normalize_main_clip(
    runner: &FfmpegRunner,
    clip: &Path,
    output: &Path,
    clip_probe: &MediaProbe,
    profile: &EncoderProfile,
) -> MediaResult<()> {
    let mut cmd = FfmpegCommand::new(clip, output)
        .video_filter(format!(
            "scale={}:{},fps={:.3}",
            clip_probe.width, clip_probe.height, clip_probe.fps
        ))
        .output_args(profile.to_ffmpeg_args())
        .output_args(["-pix_fmt", pix_fmt_or_default(clip_probe)])
        .audio_codec("aac")
        .audio_bitrate("192k");
    if clip_probe.sample_rate > 0 {
        cmd = cmd.output_args(["-ar", &clip_probe.sample_rate.to_string()]);
    }
    if clip_probe.channels > 0 {
        cmd = cmd.output_args(["-ac", &clip_probe.channels.to_string()]);
    }

    runner.run(&cmd).await
}

async fn concat_copy(
    runner: &FfmpegRunner,
    hook_clip: &Path,
    main_clip: &Path,
    output: &Path,
    work_dir: &Path,
) -> MediaResult<()> {
    let list_path = work_dir.join("hook_concat.txt");
    let listing = format!(
        "file '{}'\nfile '{}'\n",
        hook_clip.to_string_lossy(),
        main_clip.to_string_lossy()
    );
    tokio::fs::write(&list_path, listing).await?;

    let cmd = FfmpegCommand::new(&list_path, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .output_args(["-c", "copy"]);

    let result = runner.run(&cmd).await;
    let _ = tokio::fs::remove_file(&list_path).await;
    result
}

async fn concat_filter(
    runner: &FfmpegRunner,
    hook_clip: &Path,
    main_clip: &Path,
    output: &Path,
    clip_probe: &MediaProbe,
    profile: &EncoderProfile,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(hook_clip, output)
        .extra_input(main_clip)
        .filter_complex("[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a]")
        .output_args(["-map", "[v]", "-map", "[a]"])
        .output_args(profile.to_ffmpeg_args())
        .output_args(["-pix_fmt", pix_fmt_or_default(clip_probe)])
        .audio_codec("aac")
        .audio_bitrate("192k");

    runner.run(&cmd).await
}

fn pix_fmt_or_default(probe: &MediaProbe) -> &str {
    if probe.pix_fmt.is_empty() {
        "yuv420p"
    } else {
        &probe.pix_fmt
    }
}

/// Upper-case the hook text and wrap it to a fixed number of words per line.
pub fn wrap_hook_text(text: &str, words_per_line: usize) -> String {
    text.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .chunks(words_per_line.max(1))
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape text for use inside a drawtext filter argument.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}
